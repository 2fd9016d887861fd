//! Upstream adapters - HTTP access to the legacy dialer.

mod cookie_store;
mod http_transport;

pub use cookie_store::CookieSessionStore;
pub use http_transport::HttpTransport;
