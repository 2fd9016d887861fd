//! HTTP adapters - REST API implementations.

pub mod agent;
pub mod middleware;

// Re-export key types for convenience
pub use agent::{agent_routes, AgentHandlers, ErrorResponse};
pub use middleware::{AgentIdentity, AGENT_USER_HEADER};
