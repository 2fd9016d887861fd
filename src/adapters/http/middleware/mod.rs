//! HTTP middleware for axum.
//!
//! This module contains extractors for cross-cutting concerns:
//!
//! - `identity` - Trusted agent identity extraction

mod identity;

pub use identity::{AgentIdentity, AGENT_USER_HEADER};
