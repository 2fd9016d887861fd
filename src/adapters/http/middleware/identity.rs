//! Agent identity extractor.
//!
//! Operator authentication happens upstream of this service; by the time a
//! request arrives here the caller identity is trusted and travels in the
//! `x-agent-user` header. The extractor rejects requests without one.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::adapters::http::agent::ErrorResponse;
use crate::domain::dialer::AgentId;

/// Header carrying the trusted caller identity.
pub const AGENT_USER_HEADER: &str = "x-agent-user";

/// Extracts the agent identity from the request, rejecting with 401 when it
/// is absent or blank.
///
/// ```ignore
/// async fn handler(AgentIdentity(agent): AgentIdentity) -> impl IntoResponse {
///     format!("hello {agent}")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AgentIdentity(pub AgentId);

#[async_trait]
impl<S> FromRequestParts<S> for AgentIdentity
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(AGENT_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        match AgentId::new(raw) {
            Ok(agent) => Ok(AgentIdentity(agent)),
            Err(_) => Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "AGENT_IDENTITY_MISSING",
                    "request carries no agent identity",
                )),
            )
                .into_response()),
        }
    }
}
