//! Dialer error taxonomy.
//!
//! Every failure carries a machine-readable code so the caller UI can
//! render specific guidance, and an optional operator hint. Classified
//! business failures are distinct variants; unclassified upstream text
//! fails closed for state-mutating operations.

use super::classify::{ConnectOutcome, ManualDialOutcome};
use super::session::ConnectionPhase;

/// Errors surfaced by the dialer integration layer.
#[derive(Debug, thiserror::Error)]
pub enum DialerError {
    /// Transport-level network failure: timeout, refused connection,
    /// unresolved host. Retryable.
    #[error("upstream dialer unreachable: {detail}")]
    Unreachable { detail: String },

    /// Upstream base URL or API credentials are not configured.
    #[error("upstream dialer is not configured: {field} missing")]
    ConfigMissing { field: &'static str },

    /// Upstream answered with an HTTP error status.
    #[error("upstream dialer returned HTTP {status}")]
    UpstreamStatus { status: u16 },

    /// No agent secret on file for this identity.
    #[error("no agent secret on file for {agent}")]
    CredentialsMissing { agent: String },

    /// Upstream rejected the agent credentials.
    #[error("upstream rejected the agent credentials")]
    InvalidCredentials,

    /// Upstream rejected the phone login / extension.
    #[error("upstream rejected the phone login")]
    PhoneInvalid,

    /// The campaign is not assigned to this agent's user group.
    #[error("campaign is not assigned to this agent")]
    CampaignNotAssigned,

    /// The hopper has no leads for this campaign.
    #[error("no leads available in the hopper")]
    NoLeads,

    /// The agent lacks permission for the requested operation.
    #[error("agent does not have permission for this operation")]
    PermissionDenied,

    /// Upstream invalidated the session; the caller must reconnect.
    #[error("upstream session requires re-login")]
    ReloginRequired,

    /// Required runtime session fields are missing.
    #[error("dialer session incomplete, missing: {}", missing.join(", "))]
    SessionIncomplete { missing: Vec<String> },

    /// The operation was invoked from too early a connection phase.
    #[error("operation requires phase {required:?} but session is {actual:?}")]
    NotConnected {
        required: ConnectionPhase,
        actual: ConnectionPhase,
    },

    /// Phone connect was not confirmed by upstream.
    #[error("phone connect was not confirmed by upstream")]
    PhoneConnectFailed {
        status: u16,
        snippet: Option<String>,
    },

    /// The campaign listing came back without any usable option.
    #[error("no campaigns available for this agent")]
    NoCampaigns,

    /// Campaign connect was rejected for a reason with no dedicated code.
    #[error("campaign connect rejected by upstream")]
    CampaignConnectFailed {
        classification: ConnectOutcome,
        status: u16,
        snippet: Option<String>,
    },

    /// Manual dial was rejected or could not be confirmed.
    #[error("upstream did not confirm the dial")]
    DialFailed {
        classification: ManualDialOutcome,
        status: u16,
        snippet: Option<String>,
    },

    /// An agent-API call (disposition, pause, preview action) came back
    /// without a positive signal.
    #[error("upstream did not confirm {operation}")]
    NotConfirmed {
        operation: &'static str,
        status: u16,
        snippet: Option<String>,
    },

    /// The credential backend itself failed.
    #[error("credential backend failure: {0}")]
    CredentialBackend(String),
}

impl DialerError {
    /// Machine-readable error code for the caller.
    pub fn code(&self) -> &'static str {
        match self {
            DialerError::Unreachable { .. } => "UNREACHABLE",
            DialerError::ConfigMissing { .. } => "CONFIG_MISSING",
            DialerError::UpstreamStatus { .. } => "UPSTREAM_ERROR",
            DialerError::CredentialsMissing { .. } => "CREDENTIALS_MISSING",
            DialerError::InvalidCredentials => "INVALID_CREDENTIALS",
            DialerError::PhoneInvalid => "PHONE_INVALID",
            DialerError::CampaignNotAssigned => "CAMPAIGN_NOT_ASSIGNED",
            DialerError::NoLeads => "NO_LEADS",
            DialerError::PermissionDenied => "PERMISSION_DENIED",
            DialerError::ReloginRequired => "RELOGIN_REQUIRED",
            DialerError::SessionIncomplete { .. } => "SESSION_INCOMPLETE",
            DialerError::NotConnected { .. } => "NOT_CONNECTED",
            DialerError::PhoneConnectFailed { .. } => "PHONE_CONNECT_FAILED",
            DialerError::NoCampaigns => "NO_CAMPAIGNS",
            DialerError::CampaignConnectFailed { .. } => "CAMPAIGN_CONNECT_FAILED",
            DialerError::DialFailed { .. } => "DIAL_FAILED",
            DialerError::NotConfirmed { .. } => "UPSTREAM_NOT_CONFIRMED",
            DialerError::CredentialBackend(_) => "CREDENTIAL_BACKEND_ERROR",
        }
    }

    /// Operator guidance, where a single sentence helps.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            DialerError::Unreachable { .. } => {
                Some("Check connectivity to the dialer and retry.")
            }
            DialerError::ConfigMissing { .. } => {
                Some("Configure the dialer base URL and API credentials.")
            }
            DialerError::CredentialsMissing { .. } => {
                Some("An administrator must store the agent secret before this operation.")
            }
            DialerError::ReloginRequired => {
                Some("Reconnect the phone and campaign to continue.")
            }
            DialerError::SessionIncomplete { .. } => {
                Some("Reconnect the campaign to refresh the runtime session fields.")
            }
            DialerError::NotConnected { .. } => Some("Connect the phone extension first."),
            DialerError::NoLeads => Some("No leads available in the hopper for this agent."),
            DialerError::NoCampaigns => {
                Some("Check the agent's user group campaign permissions.")
            }
            _ => None,
        }
    }

    /// Whether retrying the same call later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DialerError::Unreachable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            DialerError::Unreachable {
                detail: "timeout".to_string()
            }
            .code(),
            "UNREACHABLE"
        );
        assert_eq!(
            DialerError::SessionIncomplete {
                missing: vec!["session_name".to_string()]
            }
            .code(),
            "SESSION_INCOMPLETE"
        );
        assert_eq!(
            DialerError::NotConnected {
                required: ConnectionPhase::PhoneConnected,
                actual: ConnectionPhase::Disconnected,
            }
            .code(),
            "NOT_CONNECTED"
        );
    }

    #[test]
    fn session_incomplete_names_missing_fields() {
        let err = DialerError::SessionIncomplete {
            missing: vec!["session_name".to_string(), "agent_log_id".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "dialer session incomplete, missing: session_name, agent_log_id"
        );
    }

    #[test]
    fn only_unreachable_is_retryable() {
        assert!(DialerError::Unreachable {
            detail: "refused".to_string()
        }
        .is_retryable());
        assert!(!DialerError::ReloginRequired.is_retryable());
        assert!(!DialerError::NoLeads.is_retryable());
    }
}
