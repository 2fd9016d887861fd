//! Response classification heuristics.
//!
//! The upstream dialer renders HTML for humans and never signals machines:
//! there are no status fields, no request ids, no structured errors. Every
//! business outcome is therefore inferred from phrase heuristics over the
//! raw body. Each classifier is a pure function evaluating an ordered rule
//! chain — the first matching rule wins, so ordering encodes precedence
//! (credential rejection must be recognized before the generic error rule,
//! or every credential failure would degrade into a generic one).
//!
//! Classification is conservative: when no rule matches, the result is
//! `Unknown` rather than a guessed strong outcome.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Markers that identify the upstream login form. A body showing the login
/// form means the session is not (or no longer) authenticated, regardless
/// of whatever else the page contains.
const LOGIN_FORM_MARKERS: &[&str] = &[
    "name=\"vd_login\"",
    "name='vd_login'",
    "name=\"vd_pass\"",
    "name='vd_pass'",
    "please login",
    "agent login",
    "re-login",
    "not logged in",
];

/// Explicit credential-rejection phrases. Checked before any generic error
/// detection.
const CREDENTIAL_REJECTION_MARKERS: &[&str] = &[
    "invalid username/password",
    "invalid username or password",
    "login incorrect",
];

const PHONE_REJECTION_MARKERS: &[&str] = &[
    "invalid phone login",
    "phone is not active",
    "invalid extension",
    "phone login and phone pass do not match",
];

const CAMPAIGN_REJECTION_MARKERS: &[&str] = &[
    "campaign not allowed",
    "not in your user group allowed campaigns",
    "campaign is not active",
];

const NO_LEADS_MARKERS: &[&str] = &["no leads in the hopper", "hopper is empty"];

const PERMISSION_MARKERS: &[&str] = &["does not have permission"];

/// Minimum number of agent-screen markers that must co-occur before a body
/// is believed to be an authenticated agent console. Tuned empirically
/// against one upstream version; treat as deployment configuration rather
/// than an invariant when the upstream is upgraded.
const AGENT_SCREEN_THRESHOLD: usize = 2;

static POSITIVE_SIGNAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(success(?:ful)?|logged|active|ok)\b").expect("valid regex"));

static CALL_ID_FIRST_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^M[0-9A-Z]{8,}$").expect("valid regex"));

static CALL_ID_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(M[0-9A-Z]{8,})\b").expect("valid regex"));

static FIRST_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z0-9_-]+)").expect("valid regex"));

static LEAD_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:lead_id|leadid)\s*[:=]?\s*([0-9]{1,12})").expect("valid regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Outcome of a campaign connect call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectOutcome {
    Success,
    InvalidCredentials,
    PhoneInvalid,
    CampaignNotAssigned,
    NoLeads,
    StillLoginPage,
    GenericError,
    Unknown,
}

/// Outcome of an active-lead query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActiveLeadOutcome {
    Success,
    NoActiveLead,
    ReloginRequired,
    Unknown,
}

/// Outcome of a manual-dial call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManualDialOutcome {
    Success,
    ReloginRequired,
    InvalidCredentials,
    PermissionDenied,
    NoLeads,
    Failed,
    Unknown,
}

/// Parsed manual-dial response: the classification plus whatever call and
/// lead identifiers could be recovered from the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDialResponse {
    pub outcome: ManualDialOutcome,
    pub call_id: Option<String>,
    pub lead_id: Option<i64>,
}

/// Lowercases and collapses whitespace so phrase markers match regardless
/// of the upstream's HTML formatting.
pub fn normalize(body: &str) -> String {
    WHITESPACE
        .replace_all(&body.to_lowercase(), " ")
        .trim()
        .to_string()
}

fn contains_any(body: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| body.contains(marker))
}

/// True when the body carries a generic positive signal (success / logged /
/// active / ok). Used for the phone-connect and disposition calls, whose
/// responses carry no richer structure.
pub fn has_positive_signal(body: &str) -> bool {
    POSITIVE_SIGNAL.is_match(&normalize(body))
}

/// True when the body carries an explicit credential-rejection phrase.
pub fn has_credential_rejection(body: &str) -> bool {
    contains_any(&normalize(body), CREDENTIAL_REJECTION_MARKERS)
}

/// Counts structural markers of an authenticated agent console screen.
fn agent_screen_score(body: &str) -> usize {
    let mut score = 0;
    if body.contains("session_name") {
        score += 1;
    }
    if body.contains("vdc_db_query.php") || body.contains("vicidial.php") {
        score += 1;
    }
    if body.contains("campaign") && body.contains("phone_login") {
        score += 1;
    }
    if body.contains("hangup") || body.contains("pause code") || body.contains("transfer") {
        score += 1;
    }
    if body.contains("logout") {
        score += 1;
    }
    score
}

/// Classifies a campaign connect response body.
pub fn classify_connect(raw: &str) -> ConnectOutcome {
    let body = normalize(raw);
    if contains_any(&body, LOGIN_FORM_MARKERS) {
        return ConnectOutcome::StillLoginPage;
    }
    if contains_any(&body, CREDENTIAL_REJECTION_MARKERS) {
        return ConnectOutcome::InvalidCredentials;
    }
    if contains_any(&body, PHONE_REJECTION_MARKERS) {
        return ConnectOutcome::PhoneInvalid;
    }
    if contains_any(&body, CAMPAIGN_REJECTION_MARKERS) {
        return ConnectOutcome::CampaignNotAssigned;
    }
    if contains_any(&body, NO_LEADS_MARKERS) {
        return ConnectOutcome::NoLeads;
    }
    if agent_screen_score(&body) >= AGENT_SCREEN_THRESHOLD {
        return ConnectOutcome::Success;
    }
    if body.contains("error") {
        return ConnectOutcome::GenericError;
    }
    ConnectOutcome::Unknown
}

/// Classifies an active-lead query response body.
pub fn classify_active_lead(raw: &str) -> ActiveLeadOutcome {
    let body = normalize(raw);
    if contains_any(&body, LOGIN_FORM_MARKERS) {
        return ActiveLeadOutcome::ReloginRequired;
    }
    if find_lead_id(raw).is_some() {
        return ActiveLeadOutcome::Success;
    }
    if body.is_empty() || contains_any(&body, &["no active lead", "no live call", "no lead"]) {
        return ActiveLeadOutcome::NoActiveLead;
    }
    ActiveLeadOutcome::Unknown
}

/// Parses a manual-dial response body: classification first, then call and
/// lead identifier recovery.
pub fn parse_dial_response(raw: &str) -> ParsedDialResponse {
    let body = normalize(raw);
    let lead_id = find_lead_id(raw);

    let failure = if contains_any(&body, LOGIN_FORM_MARKERS) {
        Some(ManualDialOutcome::ReloginRequired)
    } else if contains_any(&body, CREDENTIAL_REJECTION_MARKERS) {
        Some(ManualDialOutcome::InvalidCredentials)
    } else if contains_any(&body, PERMISSION_MARKERS) {
        Some(ManualDialOutcome::PermissionDenied)
    } else if contains_any(&body, NO_LEADS_MARKERS) || body.contains("no leads") {
        Some(ManualDialOutcome::NoLeads)
    } else {
        None
    };
    if let Some(outcome) = failure {
        return ParsedDialResponse {
            outcome,
            call_id: None,
            lead_id,
        };
    }

    let call_id = find_call_id(raw);
    let has_known_marker =
        contains_any(&body, &["mandialnextcall", "call_id", "lead_id", "channel"]);
    if call_id.is_some() || lead_id.is_some() || has_known_marker {
        return ParsedDialResponse {
            outcome: ManualDialOutcome::Success,
            call_id,
            lead_id,
        };
    }

    let outcome = if body.contains("error") || body.contains("invalid") || body.contains("missing")
    {
        ManualDialOutcome::Failed
    } else {
        ManualDialOutcome::Unknown
    };
    ParsedDialResponse {
        outcome,
        call_id: None,
        lead_id,
    }
}

/// Classification-only view of [`parse_dial_response`].
pub fn classify_manual_dial(raw: &str) -> ManualDialOutcome {
    parse_dial_response(raw).outcome
}

/// Finds a call identifier: the first token of the first line when it is
/// call-id shaped, otherwise a pattern search over the whole body.
pub fn find_call_id(raw: &str) -> Option<String> {
    let first_line = raw.lines().next().unwrap_or("");
    if let Some(token) = FIRST_TOKEN
        .captures(first_line)
        .map(|caps| caps[1].to_string())
    {
        if CALL_ID_FIRST_TOKEN.is_match(&token) {
            return Some(token);
        }
    }
    CALL_ID_ANYWHERE
        .captures(raw)
        .map(|caps| caps[1].to_string())
}

/// Finds a numeric lead identifier via the `lead_id` key in any of its
/// spellings.
pub fn find_lead_id(raw: &str) -> Option<i64> {
    LEAD_ID.captures(raw).and_then(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn connect_invalid_credentials_scenario() {
        assert_eq!(
            classify_connect("ERROR: Invalid Username/Password"),
            ConnectOutcome::InvalidCredentials
        );
    }

    #[test]
    fn connect_credential_rejection_beats_generic_error() {
        let body = "ERROR: something broke\nERROR: Invalid Username/Password";
        assert_eq!(classify_connect(body), ConnectOutcome::InvalidCredentials);
    }

    #[test]
    fn connect_login_form_beats_everything_else() {
        let body = "<form><input name=\"VD_login\"></form> campaign phone_login session_name";
        assert_eq!(classify_connect(body), ConnectOutcome::StillLoginPage);
    }

    #[test]
    fn connect_phone_rejection() {
        assert_eq!(
            classify_connect("Invalid Phone Login or this phone is not active"),
            ConnectOutcome::PhoneInvalid
        );
    }

    #[test]
    fn connect_campaign_rejection() {
        assert_eq!(
            classify_connect("this campaign is NOT in your user group allowed campaigns"),
            ConnectOutcome::CampaignNotAssigned
        );
    }

    #[test]
    fn connect_hopper_empty() {
        assert_eq!(
            classify_connect("There are no leads in the hopper for this campaign"),
            ConnectOutcome::NoLeads
        );
    }

    #[test]
    fn connect_agent_screen_needs_two_markers() {
        let one_marker = "<script>var session_name='x';</script>";
        assert_eq!(classify_connect(one_marker), ConnectOutcome::Unknown);

        let two_markers =
            "<script src='vicidial.php'></script> var session_name='abc'; <a>LOGOUT</a>";
        assert_eq!(classify_connect(two_markers), ConnectOutcome::Success);
    }

    #[test]
    fn connect_generic_error_and_unknown() {
        assert_eq!(
            classify_connect("ERROR: could not complete request"),
            ConnectOutcome::GenericError
        );
        assert_eq!(classify_connect("<html><body>hi</body></html>"), ConnectOutcome::Unknown);
    }

    #[test]
    fn active_lead_success_when_lead_id_present() {
        assert_eq!(
            classify_active_lead("lead_id=12345&phone_number=555000111"),
            ActiveLeadOutcome::Success
        );
    }

    #[test]
    fn active_lead_relogin_when_login_form_present() {
        let body = "<input name='VD_login'> lead_id=12345";
        assert_eq!(classify_active_lead(body), ActiveLeadOutcome::ReloginRequired);
    }

    #[test]
    fn active_lead_no_lead_markers() {
        assert_eq!(classify_active_lead(""), ActiveLeadOutcome::NoActiveLead);
        assert_eq!(
            classify_active_lead("there is no active lead for this agent"),
            ActiveLeadOutcome::NoActiveLead
        );
    }

    #[test]
    fn active_lead_unknown_for_unrecognized_text() {
        assert_eq!(
            classify_active_lead("<html>maintenance page</html>"),
            ActiveLeadOutcome::Unknown
        );
    }

    #[test]
    fn dial_response_scenario_with_call_and_lead() {
        let parsed = parse_dial_response("M251231123456789\nlead_id: 12345\nstatus: SENT");
        assert_eq!(parsed.outcome, ManualDialOutcome::Success);
        assert_eq!(parsed.call_id.as_deref(), Some("M251231123456789"));
        assert_eq!(parsed.lead_id, Some(12345));
    }

    #[test]
    fn dial_response_call_id_found_mid_body() {
        let parsed = parse_dial_response("queued call M987654321XYZ for agent");
        assert_eq!(parsed.outcome, ManualDialOutcome::Success);
        assert_eq!(parsed.call_id.as_deref(), Some("M987654321XYZ"));
    }

    #[test]
    fn dial_response_short_first_token_is_not_a_call_id() {
        let parsed = parse_dial_response("M1234\nnothing else");
        assert_eq!(parsed.call_id, None);
        assert_eq!(parsed.outcome, ManualDialOutcome::Unknown);
    }

    #[test]
    fn dial_response_relogin() {
        assert_eq!(
            classify_manual_dial("You are NOT logged in, please RE-LOGIN"),
            ManualDialOutcome::ReloginRequired
        );
    }

    #[test]
    fn dial_response_permission_denied() {
        assert_eq!(
            classify_manual_dial("this user does not have permission to place manual calls"),
            ManualDialOutcome::PermissionDenied
        );
    }

    #[test]
    fn dial_response_no_leads() {
        assert_eq!(
            classify_manual_dial("no leads in the hopper"),
            ManualDialOutcome::NoLeads
        );
    }

    #[test]
    fn dial_response_failed_vs_unknown() {
        assert_eq!(
            classify_manual_dial("ERROR: user field must be filled"),
            ManualDialOutcome::Failed
        );
        assert_eq!(classify_manual_dial("???"), ManualDialOutcome::Unknown);
    }

    #[test]
    fn positive_signal_matches_whole_words_only() {
        assert!(has_positive_signal("phone login SUCCESSFUL"));
        assert!(has_positive_signal("agent is now active"));
        assert!(!has_positive_signal("token broker looked"));
    }

    proptest! {
        /// A login-form marker dominates any other marker in the same body.
        #[test]
        fn login_form_always_wins(prefix in "[a-z]{0,40}", suffix in "[a-z]{0,40}") {
            let body = format!(
                "{prefix} please login {suffix} ERROR: Invalid Username/Password no leads in the hopper"
            );
            prop_assert_eq!(classify_connect(&body), ConnectOutcome::StillLoginPage);
            prop_assert_eq!(classify_manual_dial(&body), ManualDialOutcome::ReloginRequired);
        }

        /// Credential rejection is never masked by a generic error token.
        #[test]
        fn credential_rejection_beats_generic_error(noise in "[a-z0-9]{0,60}") {
            let body = format!("ERROR: broken {noise} Login incorrect");
            prop_assert_eq!(classify_connect(&body), ConnectOutcome::InvalidCredentials);
        }
    }
}
