//! Unique usernames for the agent user.

use std::time::{SystemTime, UNIX_EPOCH};

/// Salesforce usernames are limited to 80 characters.
const USERNAME_MAX_LEN: usize = 80;
/// CommunityNickname is limited to 40 characters.
const NICKNAME_MAX_LEN: usize = 40;

/// Milliseconds since the unix epoch, for use as a unique stamp.
pub fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Make `base` unique by inserting `.<stamp>` before the `@`.
///
/// `afdx-agent@testdrive.org` becomes `afdx-agent.1700000000000@testdrive.org`.
/// If the result would be too long, the local part is trimmed.
pub fn unique_username(base: &str, stamp: u128) -> String {
    let (local, domain) = match base.split_once('@') {
        Some((local, domain)) => (local, Some(domain)),
        None => (base, None),
    };
    let suffix = match domain {
        Some(domain) => format!(".{stamp}@{domain}"),
        None => format!(".{stamp}"),
    };
    let room = USERNAME_MAX_LEN.saturating_sub(suffix.chars().count());
    let local: String = local.chars().take(room).collect();
    format!("{local}{suffix}")
}

/// A community nickname derived from `username`: its local part, trimmed to fit.
pub fn community_nickname(username: &str) -> String {
    let local = username.split_once('@').map_or(username, |(local, _)| local);
    let len = local.chars().count();
    // keep the end, since that's where the unique stamp is.
    local.chars().skip(len.saturating_sub(NICKNAME_MAX_LEN)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_username() {
        assert_eq!(
            unique_username("afdx-agent@testdrive.org", 1700000000000),
            "afdx-agent.1700000000000@testdrive.org"
        );
        assert_eq!(unique_username("agent", 42), "agent.42");
    }

    #[test]
    fn test_unique_username_is_trimmed() {
        let base = format!("{}@example.com", "a".repeat(100));
        let name = unique_username(&base, 1700000000000);
        assert_eq!(name.len(), USERNAME_MAX_LEN);
        assert!(name.ends_with(".1700000000000@example.com"));
    }

    #[test]
    fn test_trim_counts_chars_not_bytes() {
        let base = format!("{}@exämple.com", "a".repeat(100));
        let name = unique_username(&base, 1700000000000);
        assert_eq!(name.chars().count(), USERNAME_MAX_LEN);
        assert!(name.ends_with(".1700000000000@exämple.com"));
    }

    #[test]
    fn test_different_stamps_differ() {
        let a = unique_username("afdx-agent@testdrive.org", 1);
        let b = unique_username("afdx-agent@testdrive.org", 2);
        assert_ne!(a, b);
        assert_ne!(community_nickname(&a), community_nickname(&b));
    }

    #[test]
    fn test_community_nickname() {
        assert_eq!(
            community_nickname("afdx-agent.1700000000000@testdrive.org"),
            "afdx-agent.1700000000000"
        );
        let long = format!("{}.1700000000000@x.org", "n".repeat(60));
        let nick = community_nickname(&long);
        assert_eq!(nick.chars().count(), NICKNAME_MAX_LEN);
        assert!(nick.ends_with(".1700000000000"));
    }
}
