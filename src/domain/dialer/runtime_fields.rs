//! Runtime session field extraction.
//!
//! A successful campaign connect returns an HTML page whose embedded script
//! fragments assign the transient identifiers the upstream expects to see
//! replayed on later calls (`session_name`, `server_ip`, ...). Assignments
//! appear with or without a `var ` prefix and with single-quoted,
//! double-quoted, or bare integer values, so each field is located by a
//! tolerant pattern and a missing field is simply `None`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(?:var\s+)?(session_name|server_ip|conf_exten|extension|protocol|agent_log_id)\s*=\s*(?:'([^']*)'|"([^"]*)"|([0-9]+))"#,
    )
    .expect("valid regex")
});

/// Transient per-session identifiers assigned by the upstream dialer.
///
/// All fields are optional at extraction time; each operation decides which
/// of them it cannot proceed without.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSessionFields {
    pub session_name: Option<String>,
    pub server_ip: Option<String>,
    pub conf_exten: Option<String>,
    pub extension: Option<String>,
    pub protocol: Option<String>,
    pub agent_log_id: Option<i64>,
}

impl RuntimeSessionFields {
    /// Names of the fields a manual dial cannot be built without.
    pub fn missing_for_dial(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if blank(&self.session_name) {
            missing.push("session_name".to_string());
        }
        if blank(&self.server_ip) {
            missing.push("server_ip".to_string());
        }
        if self.agent_log_id.is_none() {
            missing.push("agent_log_id".to_string());
        }
        missing
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Pulls the runtime session fields out of a raw connect response body.
/// The first assignment seen for a field wins.
pub fn extract_runtime_fields(body: &str) -> RuntimeSessionFields {
    RuntimeSessionFields {
        session_name: first_value(body, "session_name"),
        server_ip: first_value(body, "server_ip"),
        conf_exten: first_value(body, "conf_exten"),
        extension: first_value(body, "extension"),
        protocol: first_value(body, "protocol"),
        agent_log_id: first_value(body, "agent_log_id").and_then(|v| v.parse().ok()),
    }
}

fn first_value(body: &str, field: &str) -> Option<String> {
    ASSIGNMENT
        .captures_iter(body)
        .find(|caps| caps[1].eq_ignore_ascii_case(field))
        .and_then(|caps| {
            caps.get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_quoted_and_unquoted_values() {
        let body = "var session_name='abc123';\nserver_ip=\"10.0.0.9\";\nagent_log_id=42;";
        let fields = extract_runtime_fields(body);
        assert_eq!(fields.session_name.as_deref(), Some("abc123"));
        assert_eq!(fields.server_ip.as_deref(), Some("10.0.0.9"));
        assert_eq!(fields.agent_log_id, Some(42));
    }

    #[test]
    fn absent_fields_are_none_without_error() {
        let fields = extract_runtime_fields("<html>nothing useful</html>");
        assert_eq!(fields, RuntimeSessionFields::default());
    }

    #[test]
    fn first_assignment_wins() {
        let body = "session_name='first'; session_name='second';";
        let fields = extract_runtime_fields(body);
        assert_eq!(fields.session_name.as_deref(), Some("first"));
    }

    #[test]
    fn matches_case_insensitively_with_var_prefix() {
        let body = "VAR Conf_Exten = \"8600051\"; var PROTOCOL='SIP';";
        let fields = extract_runtime_fields(body);
        assert_eq!(fields.conf_exten.as_deref(), Some("8600051"));
        assert_eq!(fields.protocol.as_deref(), Some("SIP"));
    }

    #[test]
    fn extension_does_not_capture_conf_exten() {
        let body = "conf_exten='8600051';";
        let fields = extract_runtime_fields(body);
        assert_eq!(fields.conf_exten.as_deref(), Some("8600051"));
        assert_eq!(fields.extension, None);
    }

    #[test]
    fn non_numeric_log_id_yields_none() {
        let fields = extract_runtime_fields("agent_log_id='pending'");
        assert_eq!(fields.agent_log_id, None);
    }

    #[test]
    fn missing_for_dial_names_every_gap() {
        let fields = RuntimeSessionFields {
            server_ip: Some("10.0.0.1".to_string()),
            ..Default::default()
        };
        assert_eq!(fields.missing_for_dial(), vec!["session_name", "agent_log_id"]);
        assert!(extract_runtime_fields("session_name='s'; server_ip='i'; agent_log_id=7")
            .missing_for_dial()
            .is_empty());
    }
}
