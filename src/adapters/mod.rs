//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `upstream` - HTTP access to the legacy dialer (reqwest + cookie affinity)
//! - `memory` - In-memory credential store for development and tests
//! - `http` - Caller-facing REST API

pub mod http;
pub mod memory;
pub mod upstream;

pub use memory::InMemoryCredentialStore;
pub use upstream::{CookieSessionStore, HttpTransport};
