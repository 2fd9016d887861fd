//! Agent-facing HTTP adapter for the dialer operations.

mod dto;
mod handlers;
mod routes;

pub use dto::ErrorResponse;
pub use handlers::AgentHandlers;
pub use routes::agent_routes;
