//! Key-value scanning over upstream response bodies.
//!
//! Agent-API responses arrive as `key=value` pairs separated by `&` or
//! newlines, and manual-dial responses mix `key: value` lines with free
//! text. The scanner is deliberately tolerant: keys match
//! case-insensitively and unparseable segments are skipped rather than
//! rejected.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z0-9_-]+)\s*[:=]\s*(.*?)\s*$").expect("valid regex"));

/// Scans a body for `key: value` / `key=value` segments and builds a lookup
/// map with lowercased keys. The first occurrence of a key wins.
pub fn parse_key_values(body: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for segment in body.lines().flat_map(|line| line.split('&')) {
        let Some(caps) = PAIR.captures(segment) else {
            continue;
        };
        let key = caps[1].to_ascii_lowercase();
        map.entry(key).or_insert_with(|| caps[2].to_string());
    }
    map
}

/// Extracts the value of `key=value` from a raw body (`&` or newline
/// terminated), matching the key case-insensitively.
pub fn extract(body: &str, key: &str) -> Option<String> {
    let pattern = format!(r"(?i){}\s*=\s*([^&\r\n]+)", regex::escape(key));
    let re = Regex::new(&pattern).expect("valid regex");
    re.captures(body)
        .map(|caps| caps[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Like [`extract`], parsed as an integer. Unparseable values yield `None`.
pub fn extract_i64(body: &str, key: &str) -> Option<i64> {
    extract(body, key)?.parse().ok()
}

/// Returns the first non-blank value among `keys` in a parsed map.
pub fn first_present(map: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.trim().is_empty())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colon_and_equals_lines() {
        let body = "call_id: M123\nstatus=SENT\nnoise line\n";
        let map = parse_key_values(body);
        assert_eq!(map.get("call_id").map(String::as_str), Some("M123"));
        assert_eq!(map.get("status").map(String::as_str), Some("SENT"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn parses_ampersand_separated_pairs() {
        let body = "lead_id=42&phone_number=555123&campaign=IVR";
        let map = parse_key_values(body);
        assert_eq!(map.get("lead_id").map(String::as_str), Some("42"));
        assert_eq!(map.get("phone_number").map(String::as_str), Some("555123"));
        assert_eq!(map.get("campaign").map(String::as_str), Some("IVR"));
    }

    #[test]
    fn keys_are_lowercased_and_first_occurrence_wins() {
        let map = parse_key_values("Lead_ID=1\nlead_id=2");
        assert_eq!(map.get("lead_id").map(String::as_str), Some("1"));
    }

    #[test]
    fn extract_is_case_insensitive_and_stops_at_separators() {
        let body = "junk LEAD_ID=12345&next=x";
        assert_eq!(extract(body, "lead_id").as_deref(), Some("12345"));
        assert_eq!(extract_i64(body, "lead_id"), Some(12345));
    }

    #[test]
    fn extract_missing_or_blank_yields_none() {
        assert_eq!(extract("status=", "status"), None);
        assert_eq!(extract("nothing here", "lead_id"), None);
        assert_eq!(extract_i64("lead_id=abc", "lead_id"), None);
    }

    #[test]
    fn first_present_skips_blank_values() {
        let map = parse_key_values("callid=\ncallerid=M998877665544");
        assert_eq!(
            first_present(&map, &["call_id", "callid", "callerid"]).as_deref(),
            Some("M998877665544")
        );
    }
}
