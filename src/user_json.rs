//! Patching the agent user's record in `data-import/User.json`.
//!
//! The file is a `sf data import tree` plan: `{"records": [{...}, ...]}`.
//! Only the first record is touched, and only three of its fields;
//! everything else (including key order) is written back as it was read.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};

const INDENT: &[u8] = b"    ";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Expected a \"records\" array at the top level")]
    NoRecords,
    #[error("\"records\" array is empty")]
    EmptyRecords,
    #[error("First record is not a JSON object")]
    RecordNotObject,
}

/// Values written into the agent user's record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentUser {
    pub profile_id: String,
    pub username: String,
    pub community_nickname: String,
}

/// Set `ProfileId`, `Username` and `CommunityNickname` on the first record.
pub fn patch_value(json: &mut Value, user: &AgentUser) -> Result<(), Error> {
    let records = json
        .get_mut("records")
        .and_then(Value::as_array_mut)
        .ok_or(Error::NoRecords)?;
    let record = records
        .first_mut()
        .ok_or(Error::EmptyRecords)?
        .as_object_mut()
        .ok_or(Error::RecordNotObject)?;

    record.insert("ProfileId".into(), user.profile_id.clone().into());
    record.insert("Username".into(), user.username.clone().into());
    record.insert("CommunityNickname".into(), user.community_nickname.clone().into());
    Ok(())
}

/// Serialize `json` with 4-space indentation and a trailing newline.
pub fn to_pretty_string(json: &Value) -> Result<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    json.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(String::from_utf8(buf)?)
}

/// Read the file at `path`, patch it, and write it back.
pub fn patch_file(path: &Path, user: &AgentUser) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("while reading {path:?}"))?;
    let mut json: Value =
        serde_json::from_str(&text).with_context(|| format!("while parsing {path:?}"))?;

    patch_value(&mut json, user).with_context(|| format!("while patching {path:?}"))?;

    log::debug!("writing {path:?} for {}", user.username);
    fs::write(path, to_pretty_string(&json)?).with_context(|| format!("while writing {path:?}"))?;
    Ok(())
}

/// Read back the first record of the file at `path`.
#[cfg(test)]
pub fn read_first_record(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("while reading {path:?}"))?;
    let json: Value = serde_json::from_str(&text)?;
    let record = json
        .get("records")
        .and_then(Value::as_array)
        .ok_or(Error::NoRecords)?
        .first()
        .ok_or(Error::EmptyRecords)?;
    Ok(record.clone())
}
