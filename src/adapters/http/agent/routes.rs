//! HTTP routes for the agent dialer endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    active_lead, connect_campaign, connect_phone, dial_next, disconnect_phone, list_campaigns,
    manual_dial, pause, preview_action, record_interaction, status, AgentHandlers,
};

/// Creates the agent router with all endpoints.
pub fn agent_routes(handlers: AgentHandlers) -> Router {
    Router::new()
        .route("/phone/connect", post(connect_phone))
        .route("/phone/disconnect", post(disconnect_phone))
        .route("/campaigns", get(list_campaigns))
        .route("/campaign/connect", post(connect_campaign))
        .route("/dial/next", post(dial_next))
        .route("/dial/manual", post(manual_dial))
        .route("/active-lead", get(active_lead))
        .route("/status", get(status))
        .route("/interactions", post(record_interaction))
        .route("/pause", post(pause))
        .route("/preview-action", post(preview_action))
        .with_state(handlers)
}
