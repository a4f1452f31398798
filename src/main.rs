fn main() {
    if let Err(e) = afdx_setup::run() {
        afdx_setup::render_error(&e);
        std::process::exit(1);
    }
}
