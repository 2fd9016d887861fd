//! HTTP DTOs for the agent dialer endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent
//! evolution.

use serde::{Deserialize, Serialize};

use crate::application::dialer::{
    CampaignConnectReport, CampaignList, DialReport, ManualDialReport, PhoneConnectReport,
    StatusReport,
};
use crate::domain::dialer::{CampaignOption, ConnectionPhase, DialMode};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to connect the agent's phone extension.
#[derive(Debug, Clone, Deserialize)]
pub struct PhoneConnectRequest {
    pub phone_login: String,
}

/// Request to connect the agent to a campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConnectRequest {
    pub campaign_id: String,
    #[serde(default)]
    pub mode: Option<DialMode>,
    #[serde(default)]
    pub remember: Option<bool>,
}

/// Request to dial the next lead of a campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct DialNextRequest {
    pub campaign_id: String,
}

/// Request to dial an explicit phone number.
#[derive(Debug, Clone, Deserialize)]
pub struct ManualDialRequest {
    pub campaign_id: String,
    pub phone_number: String,
    #[serde(default)]
    pub phone_code: Option<String>,
    #[serde(default)]
    pub dial_timeout: Option<u32>,
    #[serde(default)]
    pub dial_prefix: Option<String>,
    #[serde(default)]
    pub preview: Option<bool>,
}

/// Request to record a call disposition.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionOutcomeRequest {
    pub disposition: String,
    #[serde(default)]
    pub lead_id: Option<i64>,
    pub campaign: String,
}

/// Request to pause or resume the agent.
#[derive(Debug, Clone, Deserialize)]
pub struct PauseRequest {
    pub pause: bool,
}

/// Request to apply a preview-dial action to a lead.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewActionRequest {
    pub lead_id: i64,
    pub campaign: String,
    pub action: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Generic acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn new() -> Self {
        Self { ok: true }
    }
}

impl Default for OkResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Structured error payload with a machine-readable code.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Response to a successful phone connect.
#[derive(Debug, Clone, Serialize)]
pub struct PhoneConnectResponse {
    pub ok: bool,
    pub phone_connected: bool,
    pub phone_login: String,
}

impl From<PhoneConnectReport> for PhoneConnectResponse {
    fn from(report: PhoneConnectReport) -> Self {
        Self {
            ok: true,
            phone_connected: true,
            phone_login: report.phone_login,
        }
    }
}

/// Response listing the agent's campaigns.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignListResponse {
    pub ok: bool,
    pub phone_login: String,
    pub campaigns: Vec<CampaignOption>,
}

impl From<CampaignList> for CampaignListResponse {
    fn from(list: CampaignList) -> Self {
        Self {
            ok: true,
            phone_login: list.phone_login,
            campaigns: list.campaigns,
        }
    }
}

/// Response to a successful campaign connect.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignConnectResponse {
    pub ok: bool,
    pub campaign: String,
    pub mode: DialMode,
    pub phone_login: String,
}

impl From<CampaignConnectReport> for CampaignConnectResponse {
    fn from(report: CampaignConnectReport) -> Self {
        Self {
            ok: true,
            campaign: report.campaign,
            mode: report.mode,
            phone_login: report.phone_login,
        }
    }
}

/// Response to a next-lead dial.
#[derive(Debug, Clone, Serialize)]
pub struct DialNextResponse {
    pub ok: bool,
    pub classification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<i64>,
}

impl From<DialReport> for DialNextResponse {
    fn from(report: DialReport) -> Self {
        match report {
            DialReport::LeadActive { call_id, lead_id } => Self {
                ok: true,
                classification: "READY".to_string(),
                call_id,
                lead_id: Some(lead_id),
            },
            DialReport::DialingNoLeadYet { call_id } => Self {
                ok: true,
                classification: "DIALING_NO_LEAD_YET".to_string(),
                call_id,
                lead_id: None,
            },
        }
    }
}

/// Response to an explicit-number manual dial.
#[derive(Debug, Clone, Serialize)]
pub struct ManualDialResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl From<ManualDialReport> for ManualDialResponse {
    fn from(report: ManualDialReport) -> Self {
        Self {
            ok: true,
            call_id: report.call_id,
            lead_id: report.lead_id,
            status: report.status,
        }
    }
}

/// Active lead payload.
#[derive(Debug, Clone, Serialize)]
pub struct LeadPayload {
    pub lead_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
}

/// Response when an active lead is present.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveLeadResponse {
    pub ok: bool,
    pub lead: LeadPayload,
}

/// Session status payload.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub agent: String,
    pub phase: ConnectionPhase,
    pub phone_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<DialMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<i64>,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_connected_at: Option<String>,
}

impl From<StatusReport> for StatusResponse {
    fn from(report: StatusReport) -> Self {
        Self {
            ok: true,
            agent: report.agent,
            phase: report.phase,
            phone_connected: report.phone_connected,
            phone_login: report.phone_login,
            campaign: report.campaign,
            mode: report.mode,
            call_id: report.call_id,
            lead_id: report.lead_id,
            ready: report.ready,
            campaign_connected_at: report.campaign_connected_at.map(|at| at.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_omits_empty_optionals() {
        let json = serde_json::to_value(ErrorResponse::new("NO_LEADS", "empty hopper")).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["code"], "NO_LEADS");
        assert!(json.get("hint").is_none());
        assert!(json.get("details").is_none());
    }

    #[test]
    fn dial_report_maps_to_classification_strings() {
        let ready: DialNextResponse = DialReport::LeadActive {
            call_id: Some("M123456789".to_string()),
            lead_id: 42,
        }
        .into();
        assert_eq!(ready.classification, "READY");
        assert_eq!(ready.lead_id, Some(42));

        let pending: DialNextResponse = DialReport::DialingNoLeadYet { call_id: None }.into();
        assert_eq!(pending.classification, "DIALING_NO_LEAD_YET");
        assert_eq!(pending.lead_id, None);
    }

    #[test]
    fn campaign_connect_request_accepts_minimal_body() {
        let req: CampaignConnectRequest =
            serde_json::from_str(r#"{"campaign_id":"IVR"}"#).unwrap();
        assert_eq!(req.campaign_id, "IVR");
        assert_eq!(req.mode, None);
        assert_eq!(req.remember, None);

        let req: CampaignConnectRequest =
            serde_json::from_str(r#"{"campaign_id":"IVR","mode":"manual","remember":true}"#)
                .unwrap();
        assert_eq!(req.mode, Some(DialMode::Manual));
        assert_eq!(req.remember, Some(true));
    }
}
