//! Dialbridge server entry point.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dialbridge::adapters::http::{agent_routes, AgentHandlers};
use dialbridge::adapters::{HttpTransport, InMemoryCredentialStore};
use dialbridge::application::DialOrchestrator;
use dialbridge::config::AppConfig;
use dialbridge::ports::{CredentialStore, DialerTransport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    // Diagnostic snippets are gated here once, so nothing downstream has to
    // reason about the environment.
    let mut dialer_config = config.dialer.clone();
    dialer_config.debug = config.diagnostics_allowed();

    let transport: Arc<dyn DialerTransport> = Arc::new(HttpTransport::new(dialer_config.clone()));
    // Credential persistence lives outside this service; the in-memory
    // store is the development default behind the same port.
    let credentials: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
    let orchestrator = Arc::new(DialOrchestrator::new(transport, credentials, dialer_config));

    let cors = {
        let origins = config.server.cors_origins_list();
        if origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let parsed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(parsed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    let app = Router::new()
        .nest("/api/agent", agent_routes(AgentHandlers::new(orchestrator)))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors);

    let addr = config.server.socket_addr();
    info!(%addr, environment = ?config.server.environment, "dialbridge listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
