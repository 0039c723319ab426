//! Field-format helpers used by input validation.

use std::sync::OnceLock;

/// Best-effort email validation.
///
/// This is intentionally not fully RFC-compliant.
pub fn is_email(s: &str) -> bool {
    static EMAIL_RE: OnceLock<regex::Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| {
            regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid built-in email regex")
        })
        .is_match(s)
}

pub fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

/// Company handles are short lowercase slugs: `[a-z0-9_-]+`.
pub fn is_handle(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email() {
        assert!(is_email("user1@user.com"));
        assert!(!is_email("user1.com"));
        assert!(!is_email("a b@c.d"));
    }

    #[test]
    fn url() {
        assert!(is_url("http://c1.img"));
        assert!(!is_url("c1.img"));
    }

    #[test]
    fn handle() {
        assert!(is_handle("anderson-arias-morrow"));
        assert!(!is_handle("C1"));
        assert!(!is_handle(""));
    }
}
