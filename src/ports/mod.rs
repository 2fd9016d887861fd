//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `DialerTransport` - HTTP access to the upstream dialer with per-agent
//!   cookie affinity
//! - `CredentialStore` - Agent secret resolution and remembered selections

mod credential_store;
mod dialer_transport;

pub use credential_store::{CredentialError, CredentialStore, LastSelection};
pub use dialer_transport::{
    DialerTransport, TransportError, UpstreamMethod, UpstreamRequest, UpstreamResponse,
};
