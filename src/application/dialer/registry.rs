//! Per-agent session registry.
//!
//! State-mutating operations for one agent must never interleave, but
//! agents must not block each other. The registry hands out one
//! `Arc<Mutex<AgentSession>>` per identity: callers lock that entry for
//! the duration of an operation, and the outer map lock is held only long
//! enough to fetch or create the entry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::domain::dialer::{AgentId, AgentSession};

/// Keyed store of per-agent session state with per-identity locking.
#[derive(Default)]
pub struct AgentSessionRegistry {
    sessions: RwLock<HashMap<AgentId, Arc<Mutex<AgentSession>>>>,
}

impl AgentSessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the agent's session entry, creating a `Disconnected` one if
    /// absent.
    pub async fn entry(&self, agent: &AgentId) -> Arc<Mutex<AgentSession>> {
        if let Some(entry) = self.sessions.read().await.get(agent) {
            return Arc::clone(entry);
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(agent.clone())
                .or_insert_with(|| Arc::new(Mutex::new(AgentSession::default()))),
        )
    }

    /// Drops the agent's entry. In-flight holders of the Arc keep their
    /// clone; the next `entry` call starts fresh.
    pub async fn remove(&self, agent: &AgentId) {
        self.sessions.write().await.remove(agent);
    }

    /// Number of tracked agents (useful for tests).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialer::ConnectionPhase;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    #[tokio::test]
    async fn entry_creates_disconnected_session() {
        let registry = AgentSessionRegistry::new();
        let entry = registry.entry(&agent("a1")).await;
        assert_eq!(entry.lock().await.phase(), ConnectionPhase::Disconnected);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn same_agent_shares_one_entry() {
        let registry = AgentSessionRegistry::new();
        let first = registry.entry(&agent("a1")).await;
        first.lock().await.phone_connected("1001".to_string());

        let second = registry.entry(&agent("a1")).await;
        assert_eq!(second.lock().await.phone_login(), Some("1001"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn agents_are_isolated() {
        let registry = AgentSessionRegistry::new();
        registry
            .entry(&agent("a1"))
            .await
            .lock()
            .await
            .phone_connected("1001".to_string());

        let other = registry.entry(&agent("a2")).await;
        assert_eq!(other.lock().await.phase(), ConnectionPhase::Disconnected);
    }

    #[tokio::test]
    async fn remove_resets_state_for_next_entry() {
        let registry = AgentSessionRegistry::new();
        registry
            .entry(&agent("a1"))
            .await
            .lock()
            .await
            .phone_connected("1001".to_string());
        registry.remove(&agent("a1")).await;

        let entry = registry.entry(&agent("a1")).await;
        assert_eq!(entry.lock().await.phase(), ConnectionPhase::Disconnected);
    }
}
