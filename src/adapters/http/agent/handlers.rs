//! HTTP handlers for the agent dialer endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::adapters::http::middleware::AgentIdentity;
use crate::application::dialer::{ActiveLeadReport, DialOrchestrator};
use crate::domain::dialer::payload::ManualDialOverrides;
use crate::domain::dialer::DialerError;

use super::dto::{
    ActiveLeadResponse, CampaignConnectRequest, CampaignConnectResponse, CampaignListResponse,
    DialNextRequest, DialNextResponse, ErrorResponse, InteractionOutcomeRequest, LeadPayload,
    ManualDialRequest, ManualDialResponse, OkResponse, PauseRequest, PhoneConnectRequest,
    PhoneConnectResponse, PreviewActionRequest, StatusResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct AgentHandlers {
    orchestrator: Arc<DialOrchestrator>,
}

impl AgentHandlers {
    pub fn new(orchestrator: Arc<DialOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/agent/phone/connect - Connect the agent's phone extension
pub async fn connect_phone(
    State(handlers): State<AgentHandlers>,
    AgentIdentity(agent): AgentIdentity,
    Json(req): Json<PhoneConnectRequest>,
) -> Response {
    match handlers
        .orchestrator
        .connect_phone(&agent, &req.phone_login)
        .await
    {
        Ok(report) => {
            let response: PhoneConnectResponse = report.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_dialer_error(e),
    }
}

/// POST /api/agent/phone/disconnect - Drop the session unconditionally
pub async fn disconnect_phone(
    State(handlers): State<AgentHandlers>,
    AgentIdentity(agent): AgentIdentity,
) -> Response {
    match handlers.orchestrator.disconnect_phone(&agent).await {
        Ok(()) => (StatusCode::OK, Json(OkResponse::new())).into_response(),
        Err(e) => handle_dialer_error(e),
    }
}

/// GET /api/agent/campaigns - List campaigns available to the agent
pub async fn list_campaigns(
    State(handlers): State<AgentHandlers>,
    AgentIdentity(agent): AgentIdentity,
) -> Response {
    match handlers.orchestrator.list_campaigns(&agent).await {
        Ok(list) => {
            let response: CampaignListResponse = list.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_dialer_error(e),
    }
}

/// POST /api/agent/campaign/connect - Connect the agent to a campaign
pub async fn connect_campaign(
    State(handlers): State<AgentHandlers>,
    AgentIdentity(agent): AgentIdentity,
    Json(req): Json<CampaignConnectRequest>,
) -> Response {
    let remember = req.remember.unwrap_or(true);
    match handlers
        .orchestrator
        .connect_campaign(&agent, &req.campaign_id, req.mode, remember)
        .await
    {
        Ok(report) => {
            let response: CampaignConnectResponse = report.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_dialer_error(e),
    }
}

/// POST /api/agent/dial/next - Dial the next lead of a campaign
pub async fn dial_next(
    State(handlers): State<AgentHandlers>,
    AgentIdentity(agent): AgentIdentity,
    Json(req): Json<DialNextRequest>,
) -> Response {
    match handlers
        .orchestrator
        .dial_next(&agent, &req.campaign_id)
        .await
    {
        Ok(report) => {
            let response: DialNextResponse = report.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_dialer_error(e),
    }
}

/// POST /api/agent/dial/manual - Dial an explicit phone number
pub async fn manual_dial(
    State(handlers): State<AgentHandlers>,
    AgentIdentity(agent): AgentIdentity,
    Json(req): Json<ManualDialRequest>,
) -> Response {
    let overrides = ManualDialOverrides {
        phone_number: req.phone_number,
        phone_code: req.phone_code,
        dial_timeout: req.dial_timeout,
        dial_prefix: req.dial_prefix,
    };
    let preview = req.preview.unwrap_or(false);
    match handlers
        .orchestrator
        .manual_dial(&agent, &req.campaign_id, overrides, preview)
        .await
    {
        Ok(report) => {
            let response: ManualDialResponse = report.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_dialer_error(e),
    }
}

/// GET /api/agent/active-lead - Classify the agent's active lead
pub async fn active_lead(
    State(handlers): State<AgentHandlers>,
    AgentIdentity(agent): AgentIdentity,
) -> Response {
    match handlers.orchestrator.query_active_lead(&agent).await {
        Ok(report) => active_lead_response(report),
        Err(e) => handle_dialer_error(e),
    }
}

/// GET /api/agent/status - Report reachability and session phase
pub async fn status(
    State(handlers): State<AgentHandlers>,
    AgentIdentity(agent): AgentIdentity,
) -> Response {
    match handlers.orchestrator.query_status(&agent).await {
        Ok(report) => {
            let response: StatusResponse = report.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_dialer_error(e),
    }
}

/// POST /api/agent/interactions - Record a call disposition
pub async fn record_interaction(
    State(handlers): State<AgentHandlers>,
    AgentIdentity(agent): AgentIdentity,
    Json(req): Json<InteractionOutcomeRequest>,
) -> Response {
    match handlers
        .orchestrator
        .record_interaction_outcome(&agent, &req.disposition, req.lead_id, &req.campaign)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(OkResponse::new())).into_response(),
        Err(e) => handle_dialer_error(e),
    }
}

/// POST /api/agent/pause - Pause or resume the agent in the queue
pub async fn pause(
    State(handlers): State<AgentHandlers>,
    AgentIdentity(agent): AgentIdentity,
    Json(req): Json<PauseRequest>,
) -> Response {
    match handlers.orchestrator.pause(&agent, req.pause).await {
        Ok(()) => (StatusCode::OK, Json(OkResponse::new())).into_response(),
        Err(e) => handle_dialer_error(e),
    }
}

/// POST /api/agent/preview-action - Apply a preview-dial action to a lead
pub async fn preview_action(
    State(handlers): State<AgentHandlers>,
    AgentIdentity(agent): AgentIdentity,
    Json(req): Json<PreviewActionRequest>,
) -> Response {
    match handlers
        .orchestrator
        .preview_action(&agent, req.lead_id, &req.campaign, &req.action)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(OkResponse::new())).into_response(),
        Err(e) => handle_dialer_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Response mapping
// ════════════════════════════════════════════════════════════════════════════

/// Non-lead outcomes of the active-lead query are business payloads, not
/// HTTP errors: the caller polls this endpoint and reacts to the code.
fn active_lead_response(report: ActiveLeadReport) -> Response {
    match report {
        ActiveLeadReport::Lead {
            lead_id,
            phone_number,
            campaign,
        } => (
            StatusCode::OK,
            Json(ActiveLeadResponse {
                ok: true,
                lead: LeadPayload {
                    lead_id,
                    phone_number,
                    campaign,
                },
            }),
        )
            .into_response(),
        ActiveLeadReport::Dialing { call_id } => (
            StatusCode::OK,
            Json(
                ErrorResponse::new("DIALING", "dial in progress, wait for the lead")
                    .with_details(json!({ "call_id": call_id })),
            ),
        )
            .into_response(),
        ActiveLeadReport::NoLead { classification } => (
            StatusCode::OK,
            Json(
                ErrorResponse::new("NO_ACTIVE_LEAD", "no active lead")
                    .with_hint("Wait for a call or check the hopper")
                    .with_details(json!({ "classification": classification })),
            ),
        )
            .into_response(),
        ActiveLeadReport::ReloginRequired => handle_dialer_error(DialerError::ReloginRequired),
    }
}

fn handle_dialer_error(error: DialerError) -> Response {
    let status = match &error {
        DialerError::Unreachable { .. } | DialerError::ConfigMissing { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        DialerError::UpstreamStatus { .. }
        | DialerError::PhoneConnectFailed { .. }
        | DialerError::CampaignConnectFailed { .. } => StatusCode::BAD_GATEWAY,
        DialerError::CredentialsMissing { .. }
        | DialerError::InvalidCredentials
        | DialerError::PhoneInvalid
        | DialerError::NoCampaigns => StatusCode::BAD_REQUEST,
        DialerError::CampaignNotAssigned
        | DialerError::NoLeads
        | DialerError::SessionIncomplete { .. }
        | DialerError::NotConnected { .. } => StatusCode::CONFLICT,
        DialerError::PermissionDenied => StatusCode::FORBIDDEN,
        DialerError::ReloginRequired => StatusCode::UNAUTHORIZED,
        DialerError::DialFailed { .. } | DialerError::NotConfirmed { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        DialerError::CredentialBackend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let mut response = ErrorResponse::new(error.code(), error.to_string());
    if let Some(hint) = error.hint() {
        response = response.with_hint(hint);
    }
    if let Some(details) = error_details(&error) {
        response = response.with_details(details);
    }
    (status, Json(response)).into_response()
}

fn error_details(error: &DialerError) -> Option<serde_json::Value> {
    match error {
        DialerError::ConfigMissing { field } => Some(json!({ "field": field })),
        DialerError::SessionIncomplete { missing } => Some(json!({ "missing": missing })),
        DialerError::NotConnected { required, actual } => {
            Some(json!({ "required": required, "actual": actual }))
        }
        DialerError::PhoneConnectFailed { status, snippet }
        | DialerError::NotConfirmed {
            status, snippet, ..
        } => Some(json!({ "http_status": status, "raw_snippet": snippet })),
        DialerError::CampaignConnectFailed {
            classification,
            status,
            snippet,
        } => Some(json!({
            "classification": classification,
            "http_status": status,
            "raw_snippet": snippet,
        })),
        DialerError::DialFailed {
            classification,
            status,
            snippet,
        } => Some(json!({
            "classification": classification,
            "http_status": status,
            "raw_snippet": snippet,
        })),
        _ => None,
    }
}
