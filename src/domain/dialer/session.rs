//! Per-agent session state machine.
//!
//! The upstream dialer exposes none of its session state queryably, so the
//! connection phase is tracked client-side. Phases are a tagged enum rather
//! than a bag of nullable fields: a `Dialing` session always has its call
//! id, and campaign/runtime data only exists once a campaign is connected,
//! so illegal combinations are unrepresentable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DialerError;
use super::runtime_fields::RuntimeSessionFields;

/// Dialing mode of the connected campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialMode {
    Manual,
    Predictive,
}

impl DialMode {
    /// Derives a mode from the upstream's dial-method string. Manual-family
    /// methods (`MANUAL`, `INBOUND_MAN`, ...) all carry the `MAN` token.
    pub fn from_dial_method(raw: &str) -> Self {
        if raw.trim().to_uppercase().contains("MAN") {
            DialMode::Manual
        } else {
            DialMode::Predictive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DialMode::Manual => "manual",
            DialMode::Predictive => "predictive",
        }
    }
}

/// Connection phase, in increasing order of session establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    Disconnected,
    PhoneConnected,
    CampaignConnected,
    Dialing,
    LeadActive,
}

/// Everything known about a connected campaign session. Refreshed wholesale
/// on every successful campaign connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignContext {
    pub phone_login: String,
    pub campaign: String,
    pub mode: DialMode,
    pub runtime: RuntimeSessionFields,
    pub connected_at: DateTime<Utc>,
}

/// Session state for one agent identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AgentSession {
    #[default]
    Disconnected,
    PhoneConnected {
        phone_login: String,
    },
    CampaignConnected(CampaignContext),
    Dialing {
        context: CampaignContext,
        call_id: String,
    },
    LeadActive {
        context: CampaignContext,
        call_id: Option<String>,
        lead_id: i64,
    },
}

impl AgentSession {
    pub fn phase(&self) -> ConnectionPhase {
        match self {
            AgentSession::Disconnected => ConnectionPhase::Disconnected,
            AgentSession::PhoneConnected { .. } => ConnectionPhase::PhoneConnected,
            AgentSession::CampaignConnected(_) => ConnectionPhase::CampaignConnected,
            AgentSession::Dialing { .. } => ConnectionPhase::Dialing,
            AgentSession::LeadActive { .. } => ConnectionPhase::LeadActive,
        }
    }

    pub fn phone_login(&self) -> Option<&str> {
        match self {
            AgentSession::Disconnected => None,
            AgentSession::PhoneConnected { phone_login } => Some(phone_login.as_str()),
            _ => self.campaign_context().map(|c| c.phone_login.as_str()),
        }
    }

    pub fn campaign_context(&self) -> Option<&CampaignContext> {
        match self {
            AgentSession::CampaignConnected(context)
            | AgentSession::Dialing { context, .. }
            | AgentSession::LeadActive { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn call_id(&self) -> Option<&str> {
        match self {
            AgentSession::Dialing { call_id, .. } => Some(call_id.as_str()),
            AgentSession::LeadActive { call_id, .. } => call_id.as_deref(),
            _ => None,
        }
    }

    pub fn lead_id(&self) -> Option<i64> {
        match self {
            AgentSession::LeadActive { lead_id, .. } => Some(*lead_id),
            _ => None,
        }
    }

    /// Fails with `NOT_CONNECTED` unless the session has reached `required`.
    pub fn require_phase(&self, required: ConnectionPhase) -> Result<(), DialerError> {
        if self.phase() < required {
            return Err(DialerError::NotConnected {
                required,
                actual: self.phase(),
            });
        }
        Ok(())
    }

    /// Enters `PhoneConnected`, discarding whatever came before. Phone
    /// connects restart the session from scratch upstream.
    pub fn phone_connected(&mut self, phone_login: String) {
        *self = AgentSession::PhoneConnected { phone_login };
    }

    /// Enters `CampaignConnected` with freshly extracted runtime fields.
    /// Legal from any phone-connected phase; re-connecting a campaign
    /// replaces the previous campaign context.
    pub fn campaign_connected(
        &mut self,
        campaign: String,
        mode: DialMode,
        runtime: RuntimeSessionFields,
    ) -> Result<(), DialerError> {
        self.require_phase(ConnectionPhase::PhoneConnected)?;
        let phone_login = self
            .phone_login()
            .map(str::to_string)
            .unwrap_or_default();
        *self = AgentSession::CampaignConnected(CampaignContext {
            phone_login,
            campaign,
            mode,
            runtime,
            connected_at: Utc::now(),
        });
        Ok(())
    }

    /// Enters `Dialing` for an in-flight call whose lead is not yet known.
    pub fn dialing(&mut self, call_id: String) -> Result<(), DialerError> {
        match self.campaign_context().cloned() {
            Some(context) => {
                *self = AgentSession::Dialing { context, call_id };
                Ok(())
            }
            None => Err(DialerError::NotConnected {
                required: ConnectionPhase::CampaignConnected,
                actual: self.phase(),
            }),
        }
    }

    /// Enters `LeadActive` once a lead id is known.
    pub fn lead_active(&mut self, call_id: Option<String>, lead_id: i64) -> Result<(), DialerError> {
        match self.campaign_context().cloned() {
            Some(context) => {
                let call_id = call_id.or_else(|| self.call_id().map(str::to_string));
                *self = AgentSession::LeadActive {
                    context,
                    call_id,
                    lead_id,
                };
                Ok(())
            }
            None => Err(DialerError::NotConnected {
                required: ConnectionPhase::CampaignConnected,
                actual: self.phase(),
            }),
        }
    }

    /// Drops dial runtime (call/lead) back to `CampaignConnected`. No-op in
    /// earlier phases.
    pub fn clear_dial(&mut self) {
        if let Some(context) = self.campaign_context().cloned() {
            *self = AgentSession::CampaignConnected(context);
        }
    }

    /// Returns to `Disconnected`. Idempotent.
    pub fn disconnect(&mut self) {
        *self = AgentSession::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> RuntimeSessionFields {
        RuntimeSessionFields {
            session_name: Some("sess".to_string()),
            server_ip: Some("10.0.0.1".to_string()),
            agent_log_id: Some(99),
            ..Default::default()
        }
    }

    fn connected_session() -> AgentSession {
        let mut session = AgentSession::default();
        session.phone_connected("1001".to_string());
        session
            .campaign_connected("IVR".to_string(), DialMode::Manual, runtime())
            .unwrap();
        session
    }

    #[test]
    fn starts_disconnected() {
        assert_eq!(AgentSession::default().phase(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn campaign_connect_requires_phone() {
        let mut session = AgentSession::default();
        let err = session
            .campaign_connected("IVR".to_string(), DialMode::Predictive, runtime())
            .unwrap_err();
        assert!(matches!(err, DialerError::NotConnected { .. }));
    }

    #[test]
    fn full_lifecycle_transitions() {
        let mut session = connected_session();
        assert_eq!(session.phase(), ConnectionPhase::CampaignConnected);
        assert_eq!(session.phone_login(), Some("1001"));

        session.dialing("M123456789".to_string()).unwrap();
        assert_eq!(session.phase(), ConnectionPhase::Dialing);
        assert_eq!(session.call_id(), Some("M123456789"));
        assert_eq!(session.lead_id(), None);

        session.lead_active(None, 777).unwrap();
        assert_eq!(session.phase(), ConnectionPhase::LeadActive);
        assert_eq!(session.call_id(), Some("M123456789"));
        assert_eq!(session.lead_id(), Some(777));

        session.clear_dial();
        assert_eq!(session.phase(), ConnectionPhase::CampaignConnected);
        assert_eq!(session.call_id(), None);
    }

    #[test]
    fn lead_active_without_prior_dial_keeps_no_call_id() {
        let mut session = connected_session();
        session.lead_active(None, 55).unwrap();
        assert_eq!(session.call_id(), None);
        assert_eq!(session.lead_id(), Some(55));
    }

    #[test]
    fn reconnecting_campaign_replaces_context() {
        let mut session = connected_session();
        session.dialing("M111111111".to_string()).unwrap();
        session
            .campaign_connected("OUT".to_string(), DialMode::Predictive, runtime())
            .unwrap();
        assert_eq!(session.phase(), ConnectionPhase::CampaignConnected);
        assert_eq!(session.campaign_context().unwrap().campaign, "OUT");
        assert_eq!(session.call_id(), None);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut session = connected_session();
        session.disconnect();
        let after_first = session.clone();
        session.disconnect();
        assert_eq!(session, after_first);
        assert_eq!(session.phase(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn dial_mode_from_dial_method() {
        assert_eq!(DialMode::from_dial_method("MANUAL"), DialMode::Manual);
        assert_eq!(DialMode::from_dial_method("INBOUND_MAN"), DialMode::Manual);
        assert_eq!(DialMode::from_dial_method("RATIO"), DialMode::Predictive);
        assert_eq!(DialMode::from_dial_method("ADAPT_PREDICTIVE"), DialMode::Predictive);
    }
}
