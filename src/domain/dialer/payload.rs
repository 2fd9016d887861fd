//! Form payload builders for upstream calls.
//!
//! The upstream endpoints were built for browser forms, so requests must
//! replay the exact field sets a browser session would submit — including
//! reserved fields that are always empty. Builders here are pure; the
//! orchestrator supplies credentials and session context.

use super::error::DialerError;
use super::session::CampaignContext;

/// Browser-facing console endpoint (phone and campaign connect).
pub const AGENT_CONSOLE_PATH: &str = "/agc/vicidial.php";
/// Plain-text agent API endpoint (`function`-selected sub-operations).
pub const AGENT_API_PATH: &str = "/agc/api.php";
/// Form-action endpoint for manual dialing and campaign listing.
pub const DB_QUERY_PATH: &str = "/agc/vdc_db_query.php";

/// Viewport dimensions replayed to impersonate the browser console.
const BROWSER_HEIGHT: &str = "641";
const BROWSER_WIDTH: &str = "695";

/// Caller-supplied overrides for an explicit-number manual dial.
#[derive(Debug, Clone, Default)]
pub struct ManualDialOverrides {
    pub phone_number: String,
    pub phone_code: Option<String>,
    pub dial_timeout: Option<u32>,
    pub dial_prefix: Option<String>,
}

/// Builds the connect form. With `operator` absent this is the first-stage
/// phone login; with operator credentials and a campaign it is the full
/// campaign connect.
pub fn connect_payload(
    phone_login: &str,
    phone_pass: &str,
    operator: Option<(&str, &str)>,
    campaign: Option<&str>,
) -> Vec<(String, String)> {
    let mut form = vec![
        ("DB".to_string(), "0".to_string()),
        ("JS_browser_height".to_string(), BROWSER_HEIGHT.to_string()),
        ("JS_browser_width".to_string(), BROWSER_WIDTH.to_string()),
        ("LOGINvarONE".to_string(), String::new()),
        ("LOGINvarTWO".to_string(), String::new()),
        ("LOGINvarTHREE".to_string(), String::new()),
        ("LOGINvarFOUR".to_string(), String::new()),
        ("LOGINvarFIVE".to_string(), String::new()),
        ("hide_relogin_fields".to_string(), String::new()),
        ("phone_login".to_string(), phone_login.to_string()),
        ("phone_pass".to_string(), phone_pass.to_string()),
    ];
    if let Some((user, pass)) = operator {
        form.push(("VD_login".to_string(), user.to_string()));
        form.push(("VD_pass".to_string(), pass.to_string()));
        form.push(("VD_campaign".to_string(), campaign.unwrap_or("").to_string()));
    }
    form
}

/// Builds the manual-dial form for `ACTION=manDiaLnextCaLL`.
///
/// Validates session completeness up front and names every missing field at
/// once, so the operator sees the whole gap instead of one field per retry.
pub fn manual_dial_payload(
    user: &str,
    pass: &str,
    context: &CampaignContext,
    campaign: &str,
    overrides: Option<&ManualDialOverrides>,
    preview: bool,
) -> Result<Vec<(String, String)>, DialerError> {
    let mut missing = Vec::new();
    if context.phone_login.trim().is_empty() {
        missing.push("phone_login".to_string());
    }
    if campaign.trim().is_empty() {
        missing.push("campaign".to_string());
    }
    missing.extend(context.runtime.missing_for_dial());
    if !missing.is_empty() {
        return Err(DialerError::SessionIncomplete { missing });
    }

    let runtime = &context.runtime;
    let conf_exten = runtime
        .conf_exten
        .clone()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| context.phone_login.clone());
    let agent_log_id = runtime
        .agent_log_id
        .map(|id| id.to_string())
        .unwrap_or_default();

    let form = vec![
        ("ACTION".to_string(), "manDiaLnextCaLL".to_string()),
        (
            "server_ip".to_string(),
            runtime.server_ip.clone().unwrap_or_default(),
        ),
        (
            "session_name".to_string(),
            runtime.session_name.clone().unwrap_or_default(),
        ),
        ("user".to_string(), user.to_string()),
        ("pass".to_string(), pass.to_string()),
        ("campaign".to_string(), campaign.to_string()),
        ("conf_exten".to_string(), conf_exten),
        ("exten".to_string(), context.phone_login.clone()),
        ("phone_login".to_string(), context.phone_login.clone()),
        ("agent_log_id".to_string(), agent_log_id),
        (
            "phone_code".to_string(),
            overrides
                .map(|o| o.phone_code.clone().unwrap_or_else(|| "51".to_string()))
                .unwrap_or_default(),
        ),
        (
            "phone_number".to_string(),
            overrides.map(|o| o.phone_number.clone()).unwrap_or_default(),
        ),
        (
            "dial_timeout".to_string(),
            overrides
                .map(|o| normalized_dial_timeout(o.dial_timeout).to_string())
                .unwrap_or_default(),
        ),
        (
            "dial_prefix".to_string(),
            overrides
                .map(|o| o.dial_prefix.clone().unwrap_or_else(|| "9".to_string()))
                .unwrap_or_default(),
        ),
        (
            "preview".to_string(),
            if preview { "YES" } else { "NO" }.to_string(),
        ),
        ("list_id".to_string(), String::new()),
        ("channel".to_string(), build_channel(context)),
    ];
    Ok(form)
}

fn normalized_dial_timeout(value: Option<u32>) -> u32 {
    match value {
        Some(v) if v > 0 => v,
        _ => 60,
    }
}

/// Channel binding: the extracted extension wins, then `PROTOCOL/conf_exten`,
/// then empty (upstream derives it server-side).
fn build_channel(context: &CampaignContext) -> String {
    let runtime = &context.runtime;
    if let Some(extension) = runtime.extension.as_deref().filter(|v| !v.trim().is_empty()) {
        return extension.to_string();
    }
    match (
        runtime.protocol.as_deref().filter(|v| !v.trim().is_empty()),
        runtime.conf_exten.as_deref().filter(|v| !v.trim().is_empty()),
    ) {
        (Some(protocol), Some(conf_exten)) => {
            format!("{}/{}", protocol.to_uppercase(), conf_exten)
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialer::runtime_fields::RuntimeSessionFields;
    use crate::domain::dialer::session::DialMode;
    use chrono::Utc;

    fn context(runtime: RuntimeSessionFields) -> CampaignContext {
        CampaignContext {
            phone_login: "1001".to_string(),
            campaign: "IVR".to_string(),
            mode: DialMode::Manual,
            runtime,
            connected_at: Utc::now(),
        }
    }

    fn full_runtime() -> RuntimeSessionFields {
        RuntimeSessionFields {
            session_name: Some("sess42".to_string()),
            server_ip: Some("10.0.0.9".to_string()),
            conf_exten: Some("8600051".to_string()),
            extension: Some("SIP/1001".to_string()),
            protocol: Some("SIP".to_string()),
            agent_log_id: Some(99),
        }
    }

    fn value_of<'a>(form: &'a [(String, String)], key: &str) -> &'a str {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing field {key}"))
    }

    #[test]
    fn connect_payload_includes_reserved_empty_fields() {
        let form = connect_payload("1001", "pp_1001", None, None);
        for field in [
            "LOGINvarONE",
            "LOGINvarTWO",
            "LOGINvarTHREE",
            "LOGINvarFOUR",
            "LOGINvarFIVE",
            "hide_relogin_fields",
        ] {
            assert_eq!(value_of(&form, field), "");
        }
        assert_eq!(value_of(&form, "DB"), "0");
        assert_eq!(value_of(&form, "phone_login"), "1001");
        assert_eq!(value_of(&form, "phone_pass"), "pp_1001");
        assert!(!form.iter().any(|(k, _)| k == "VD_login"));
    }

    #[test]
    fn connect_payload_with_operator_adds_campaign_fields() {
        let form = connect_payload("1001", "pp_1001", Some(("agent7", "secret")), Some("IVR"));
        assert_eq!(value_of(&form, "VD_login"), "agent7");
        assert_eq!(value_of(&form, "VD_pass"), "secret");
        assert_eq!(value_of(&form, "VD_campaign"), "IVR");
    }

    #[test]
    fn dial_payload_happy_path() {
        let ctx = context(full_runtime());
        let form = manual_dial_payload("agent7", "secret", &ctx, "IVR", None, false).unwrap();
        assert_eq!(value_of(&form, "ACTION"), "manDiaLnextCaLL");
        assert_eq!(value_of(&form, "server_ip"), "10.0.0.9");
        assert_eq!(value_of(&form, "session_name"), "sess42");
        assert_eq!(value_of(&form, "agent_log_id"), "99");
        assert_eq!(value_of(&form, "exten"), "1001");
        assert_eq!(value_of(&form, "preview"), "NO");
        assert_eq!(value_of(&form, "phone_number"), "");
        assert_eq!(value_of(&form, "channel"), "SIP/1001");
    }

    #[test]
    fn dial_payload_names_all_missing_fields_at_once() {
        let ctx = context(RuntimeSessionFields::default());
        let err = manual_dial_payload("agent7", "secret", &ctx, "", None, false).unwrap_err();
        match err {
            DialerError::SessionIncomplete { missing } => {
                assert_eq!(
                    missing,
                    vec!["campaign", "session_name", "server_ip", "agent_log_id"]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn dial_payload_override_defaults() {
        let ctx = context(full_runtime());
        let overrides = ManualDialOverrides {
            phone_number: "555000111".to_string(),
            ..Default::default()
        };
        let form =
            manual_dial_payload("agent7", "secret", &ctx, "IVR", Some(&overrides), true).unwrap();
        assert_eq!(value_of(&form, "phone_number"), "555000111");
        assert_eq!(value_of(&form, "phone_code"), "51");
        assert_eq!(value_of(&form, "dial_timeout"), "60");
        assert_eq!(value_of(&form, "dial_prefix"), "9");
        assert_eq!(value_of(&form, "preview"), "YES");
    }

    #[test]
    fn channel_falls_back_to_protocol_and_conf_exten() {
        let mut runtime = full_runtime();
        runtime.extension = None;
        let ctx = context(runtime);
        let form = manual_dial_payload("agent7", "secret", &ctx, "IVR", None, false).unwrap();
        assert_eq!(value_of(&form, "channel"), "SIP/8600051");

        let mut runtime = full_runtime();
        runtime.extension = None;
        runtime.protocol = None;
        let ctx = context(runtime);
        let form = manual_dial_payload("agent7", "secret", &ctx, "IVR", None, false).unwrap();
        assert_eq!(value_of(&form, "channel"), "");

        let mut runtime = full_runtime();
        runtime.conf_exten = None;
        let ctx = context(runtime);
        let form = manual_dial_payload("agent7", "secret", &ctx, "IVR", None, false).unwrap();
        // conf_exten falls back to the phone login when absent
        assert_eq!(value_of(&form, "conf_exten"), "1001");
    }
}
