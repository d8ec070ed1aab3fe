//! Feed configuration read from the environment.

use std::env;

/// Name of the environment variable holding the feed URL.
pub static FEED_URL_VAR: &str = "ICS_URL";

/// Get the configured feed URL.
///
/// Unset and blank values are both treated as missing.
pub fn feed_url() -> Option<String> {
    non_blank(env::var(FEED_URL_VAR).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use crate::config::non_blank;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(String::from("   "))), None);
        assert_eq!(
            non_blank(Some(String::from(" https://example.com/feed.ics\n"))),
            Some(String::from("https://example.com/feed.ics"))
        );
    }
}
