//! HTTP Transport - reqwest implementation of the dialer transport port.
//!
//! Maps low-level reqwest failures onto the transport taxonomy: timeouts,
//! refused connections and DNS failures all become `Unreachable`; HTTP
//! statuses >= 400 become `Protocol`. The transport never retries — retry
//! policy belongs to the orchestrator.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::adapters::upstream::CookieSessionStore;
use crate::config::DialerConfig;
use crate::domain::dialer::AgentId;
use crate::ports::{
    DialerTransport, TransportError, UpstreamMethod, UpstreamRequest, UpstreamResponse,
};

/// Probe budget is deliberately tighter than regular calls: the probe
/// answers "is it worth trying at all", not "fetch a page".
const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// reqwest-backed upstream transport with per-agent cookie affinity.
pub struct HttpTransport {
    config: DialerConfig,
    stateless: Client,
    cookies: CookieSessionStore,
}

impl HttpTransport {
    pub fn new(config: DialerConfig) -> Self {
        let stateless = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .build()
            .expect("Failed to create HTTP client");
        let cookies = CookieSessionStore::new(
            config.session_ttl(),
            config.connect_timeout(),
            config.read_timeout(),
        );
        Self {
            config,
            stateless,
            cookies,
        }
    }

    fn base_url(&self) -> Result<&str, TransportError> {
        self.config
            .base_url()
            .ok_or(TransportError::ConfigMissing { field: "base_url" })
    }

    async fn execute(
        &self,
        client: &Client,
        req: &UpstreamRequest,
    ) -> Result<UpstreamResponse, TransportError> {
        let url = format!("{}{}", self.base_url()?, req.path);
        let started = Instant::now();

        let builder = match req.method {
            UpstreamMethod::Get => client.get(&url).query(&req.params),
            UpstreamMethod::PostForm => client.post(&url).form(&req.params),
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        if status >= 400 {
            return Err(TransportError::Protocol { status });
        }
        let body = response.text().await.map_err(map_reqwest_error)?;

        debug!(
            path = %req.path,
            status,
            duration_ms = started.elapsed().as_millis() as u64,
            body_len = body.len(),
            "upstream call"
        );
        Ok(UpstreamResponse { status, body })
    }
}

#[async_trait]
impl DialerTransport for HttpTransport {
    async fn request(&self, req: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        self.execute(&self.stateless, &req).await
    }

    async fn request_with_session(
        &self,
        agent: &AgentId,
        req: UpstreamRequest,
    ) -> Result<UpstreamResponse, TransportError> {
        let client = self.cookies.client_for(agent).await;
        let response = self.execute(&client, &req).await?;
        self.cookies.touch(agent).await;
        Ok(response)
    }

    async fn clear_session(&self, agent: &AgentId) {
        self.cookies.clear(agent).await;
    }

    async fn probe(&self) -> Result<(), TransportError> {
        let base = self.base_url()?.to_string();
        let client = Client::builder()
            .connect_timeout(PROBE_CONNECT_TIMEOUT)
            .timeout(PROBE_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        // Any HTTP answer proves reachability; the landing page's status is
        // irrelevant.
        client
            .get(&base)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    let detail = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    };
    TransportError::Unreachable { detail }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    #[tokio::test]
    async fn unconfigured_base_url_is_config_missing() {
        let transport = HttpTransport::new(DialerConfig::default());
        let err = transport
            .request(UpstreamRequest::get("/agc/api.php"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::ConfigMissing { field: "base_url" }
        ));

        let err = transport.probe().await.unwrap_err();
        assert!(matches!(err, TransportError::ConfigMissing { .. }));
    }

    #[tokio::test]
    async fn refused_connection_maps_to_unreachable() {
        // Port 9 (discard) on localhost is as close to a guaranteed refusal
        // as a unit test can get without spawning a server.
        let config = DialerConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            connect_timeout_secs: 1,
            read_timeout_secs: 1,
            ..Default::default()
        };
        let transport = HttpTransport::new(config);
        let err = transport
            .request_with_session(&agent("a1"), UpstreamRequest::get("/agc/api.php"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unreachable { .. }));
    }
}
