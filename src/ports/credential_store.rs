//! Credential Store Port - agent secret resolution boundary.
//!
//! Secret material is owned by an external collaborator; this layer only
//! resolves it per agent and records the last-used selection. The
//! orchestrator never persists secrets itself.

use async_trait::async_trait;
use secrecy::Secret;

use crate::domain::dialer::AgentId;

/// The phone/campaign pair an agent last connected with, remembered so the
/// UI can preselect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSelection {
    pub phone_login: String,
    pub campaign: String,
}

/// Credential backend failure.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential backend unavailable: {0}")]
    Backend(String),
}

/// Port for per-agent secret material and remembered selections.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Resolves the agent's dialer secret. `None` means no secret is on
    /// file — an operator must store one before agent-credentialed calls.
    async fn agent_pass(&self, agent: &AgentId) -> Result<Option<Secret<String>>, CredentialError>;

    /// Persists the last-used phone/campaign selection.
    async fn save_last_selection(
        &self,
        agent: &AgentId,
        selection: LastSelection,
    ) -> Result<(), CredentialError>;

    /// Returns the remembered selection, if any.
    async fn last_selection(&self, agent: &AgentId)
        -> Result<Option<LastSelection>, CredentialError>;
}
