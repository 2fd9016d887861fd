//! In-Memory Credential Store Adapter
//!
//! Holds agent secrets and remembered selections in memory. Useful for
//! development and tests; real deployments plug a persistent backend into
//! the same port.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::Secret;
use tokio::sync::RwLock;

use crate::domain::dialer::AgentId;
use crate::ports::{CredentialError, CredentialStore, LastSelection};

/// In-memory credential store.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    passwords: RwLock<HashMap<AgentId, Secret<String>>>,
    selections: RwLock<HashMap<AgentId, LastSelection>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a secret for an agent (builder form for tests).
    pub async fn set_agent_pass(&self, agent: AgentId, pass: impl Into<String>) {
        self.passwords
            .write()
            .await
            .insert(agent, Secret::new(pass.into()));
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn agent_pass(&self, agent: &AgentId) -> Result<Option<Secret<String>>, CredentialError> {
        Ok(self.passwords.read().await.get(agent).cloned())
    }

    async fn save_last_selection(
        &self,
        agent: &AgentId,
        selection: LastSelection,
    ) -> Result<(), CredentialError> {
        self.selections.write().await.insert(agent.clone(), selection);
        Ok(())
    }

    async fn last_selection(
        &self,
        agent: &AgentId,
    ) -> Result<Option<LastSelection>, CredentialError> {
        Ok(self.selections.read().await.get(agent).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    #[tokio::test]
    async fn resolves_stored_secret() {
        let store = InMemoryCredentialStore::new();
        assert!(store.agent_pass(&agent("a1")).await.unwrap().is_none());

        store.set_agent_pass(agent("a1"), "s3cret").await;
        let pass = store.agent_pass(&agent("a1")).await.unwrap().unwrap();
        assert_eq!(pass.expose_secret(), "s3cret");
    }

    #[tokio::test]
    async fn remembers_last_selection_per_agent() {
        let store = InMemoryCredentialStore::new();
        store
            .save_last_selection(
                &agent("a1"),
                LastSelection {
                    phone_login: "1001".to_string(),
                    campaign: "IVR".to_string(),
                },
            )
            .await
            .unwrap();

        let selection = store.last_selection(&agent("a1")).await.unwrap().unwrap();
        assert_eq!(selection.phone_login, "1001");
        assert!(store.last_selection(&agent("a2")).await.unwrap().is_none());
    }
}
