//! Per-agent cookie session store.
//!
//! The upstream dialer identifies a browser session by its cookies, so each
//! agent gets a dedicated `reqwest::Client` with its own cookie jar. Jars
//! are created lazily, their expiry is refreshed on every successful call,
//! and expired entries are swept opportunistically before each lookup — no
//! background timer needed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::dialer::AgentId;

struct CookieSession {
    client: Client,
    expires_at: Instant,
}

/// Keyed store of cookie-bearing clients, one per agent identity.
pub struct CookieSessionStore {
    ttl: Duration,
    connect_timeout: Duration,
    read_timeout: Duration,
    sessions: RwLock<HashMap<AgentId, CookieSession>>,
}

impl CookieSessionStore {
    pub fn new(ttl: Duration, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            ttl,
            connect_timeout,
            read_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the agent's cookie-bearing client, creating a fresh one when
    /// absent or expired. Runs the expiry sweep first.
    pub async fn client_for(&self, agent: &AgentId) -> Client {
        self.evict_expired().await;

        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        match sessions.get(agent) {
            Some(session) if session.expires_at > now => session.client.clone(),
            _ => {
                debug!(agent = %agent, "creating cookie session");
                let client = self.build_client();
                sessions.insert(
                    agent.clone(),
                    CookieSession {
                        client: client.clone(),
                        expires_at: now + self.ttl,
                    },
                );
                client
            }
        }
    }

    /// Extends the agent's session expiry. No-op for unknown agents.
    pub async fn touch(&self, agent: &AgentId) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(agent) {
            session.expires_at = Instant::now() + self.ttl;
        }
    }

    /// Removes every expired session.
    pub async fn evict_expired(&self) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| session.expires_at > now);
    }

    /// Drops the agent's session and its cookies.
    pub async fn clear(&self, agent: &AgentId) {
        self.sessions.write().await.remove(agent);
    }

    /// Number of live sessions (useful for tests).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn build_client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .connect_timeout(self.connect_timeout)
            .timeout(self.read_timeout)
            .build()
            .expect("Failed to create HTTP client")
    }
}
