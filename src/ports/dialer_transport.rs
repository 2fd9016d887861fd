//! Dialer Transport Port - HTTP access to the upstream dialer.
//!
//! The transport carries requests and raw bodies only; it never interprets
//! business content. Success here means "a body came back" — whether that
//! body is a business success is decided later by the classifiers. Retry
//! policy belongs to the orchestrator, never to the transport.

use async_trait::async_trait;

use crate::domain::dialer::AgentId;

/// HTTP method for an upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamMethod {
    Get,
    PostForm,
}

/// A request against the upstream base URL. Parameter values may be empty
/// strings — the upstream's forms expect reserved fields to be transmitted
/// even when blank.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: UpstreamMethod,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl UpstreamRequest {
    /// Creates a GET request with query parameters.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: UpstreamMethod::Get,
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Creates a form-encoded POST request.
    pub fn post_form(path: impl Into<String>) -> Self {
        Self {
            method: UpstreamMethod::PostForm,
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Adds one parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Adds a batch of parameters.
    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }
}

/// A raw upstream response. The status is always < 400; error statuses are
/// surfaced as [`TransportError::Protocol`].
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    /// A bounded prefix of the body for diagnostics.
    pub fn snippet(&self, max_len: usize) -> String {
        let flattened = self.body.replace(['\r', '\n'], " ");
        let trimmed = flattened.trim();
        trimmed.chars().take(max_len).collect()
    }
}

/// Transport failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Timeout, refused connection, or unresolved host.
    #[error("upstream unreachable: {detail}")]
    Unreachable { detail: String },

    /// Upstream answered with HTTP status >= 400.
    #[error("upstream returned HTTP {status}")]
    Protocol { status: u16 },

    /// The upstream endpoint is not configured.
    #[error("upstream endpoint not configured: {field}")]
    ConfigMissing { field: &'static str },
}

/// Port for upstream dialer HTTP access.
///
/// `request_with_session` routes through the agent's cookie jar so the
/// upstream sees one continuous browser session per agent; `request` uses a
/// jar-less client for stateless API calls.
#[async_trait]
pub trait DialerTransport: Send + Sync {
    /// Performs a stateless request.
    async fn request(&self, req: UpstreamRequest) -> Result<UpstreamResponse, TransportError>;

    /// Performs a request through the agent's cookie session, creating the
    /// session lazily and refreshing its expiry on success.
    async fn request_with_session(
        &self,
        agent: &AgentId,
        req: UpstreamRequest,
    ) -> Result<UpstreamResponse, TransportError>;

    /// Drops the agent's cookie session.
    async fn clear_session(&self, agent: &AgentId);

    /// Cheap reachability probe against the upstream base URL.
    async fn probe(&self) -> Result<(), TransportError>;
}
