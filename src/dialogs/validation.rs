//! Field predicates used by the booking waterfall and the field resolvers.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::timex::{TimexProperty, TimexType};

/// Letters outside ASCII accepted anywhere a letter is.
const EXTENDED: &str = r"\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    let atext = format!(r"[a-z0-9!#$%&'*+\-/=?^_`{{|}}~{EXTENDED}]");
    let qtext = format!(r"[\x01-\x08\x0b\x0c\x0e-\x1f\x7f\x21\x23-\x5b\x5d-\x7e{EXTENDED}]");
    let quoted_pair = format!(r"\\[\x01-\x09\x0b\x0c\x0d-\x7f{EXTENDED}]");
    let fws = r"(?:(?:[ \t]*\r\n)?[ \t]+)";
    let quoted = format!(r#""(?:{fws}?(?:{qtext}|{quoted_pair}))*{fws}?""#);
    let local = format!(r"(?:{atext}+(?:\.{atext}+)*|{quoted})");

    let alnum = format!("[a-z0-9{EXTENDED}]");
    let alpha = format!("[a-z{EXTENDED}]");
    let inner = format!(r"[a-z0-9\-._~{EXTENDED}]");
    let label = format!(r"(?:{alnum}|{alnum}{inner}*{alnum})\.");
    let tld = format!("(?:{alpha}|{alpha}{inner}*{alpha})");

    Regex::new(&format!("(?i)^{local}@(?:{label})+{tld}$")).expect("email pattern is valid")
});

/// True iff the TIMEX names a specific calendar day and a time on it.
pub fn is_definite_datetime(timex: &str) -> bool {
    TimexProperty::parse(timex)
        .map(|t| t.has(TimexType::Definite) && t.has(TimexType::DateTime))
        .unwrap_or(false)
}

/// Strict address check on the trimmed candidate. A trailing dot is rejected.
pub fn is_valid_email(candidate: &str) -> bool {
    let candidate = candidate.trim();
    !candidate.is_empty() && !candidate.contains("..") && EMAIL_RE.is_match(candidate)
}

/// Acceptance predicate for a typed email answer: one trailing dot is tolerated
/// and removed by [`strip_trailing_dot`] when the answer is committed.
pub fn accepts_email_answer(candidate: &str) -> bool {
    is_valid_email(strip_trailing_dot(candidate))
}

pub fn strip_trailing_dot(candidate: &str) -> &str {
    candidate.strip_suffix('.').unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definite_datetime() {
        assert!(is_definite_datetime("2023-11-15T14:00"));
        assert!(is_definite_datetime("2023-11-15T14"));
        assert!(!is_definite_datetime("2023"));
        assert!(!is_definite_datetime("2023-11-15"));
        assert!(!is_definite_datetime("XXXX-11-15T14"));
        assert!(!is_definite_datetime("XXXX-WXX-2T14"));
        assert!(!is_definite_datetime("T14"));
        assert!(!is_definite_datetime("next tuesday"));
        assert!(!is_definite_datetime(""));
    }

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("jane.doe@example.com"));
        assert!(is_valid_email("bob@x.com"));
        assert!(is_valid_email("  carol@org.com  "));
        assert!(is_valid_email("Carol+Work@Sub.Example.ORG"));
        assert!(is_valid_email("\"jane doe\"@example.com"));
        assert!(is_valid_email("josé@exämple.com"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("   "));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a..b@example.com"));
        assert!(!is_valid_email("jane@example..com"));
        assert!(!is_valid_email(".jane@example.com"));
        assert!(!is_valid_email("jane@localhost"));
        assert!(!is_valid_email("jane@example.123"));
        assert!(!is_valid_email("jane doe@example.com"));
        assert!(!is_valid_email("jane@@example.com"));
    }

    #[test]
    fn test_trailing_dot_needs_resolver() {
        assert!(!is_valid_email("jane.doe@example.com."));
        assert!(accepts_email_answer("jane.doe@example.com."));
        assert_eq!(strip_trailing_dot("jane.doe@example.com."), "jane.doe@example.com");
        assert!(!accepts_email_answer("jane.doe@example.com.."));
        assert!(!accepts_email_answer("a..b@example.com."));
    }

    #[test]
    fn test_strip_trailing_dot_only_removes_one() {
        assert_eq!(strip_trailing_dot("x.."), "x.");
        assert_eq!(strip_trailing_dot(" x. "), " x. ");
        assert_eq!(strip_trailing_dot("x"), "x");
    }
}
