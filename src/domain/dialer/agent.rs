//! Agent identity newtype.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The caller-side principal on whose behalf a dialer session is held.
///
/// All session affinity (cookie jars, connection state, per-identity locks)
/// is keyed by this value. It is supplied by the trusted caller and never
/// derived from upstream responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

/// Error returned when an agent identity is empty.
#[derive(Debug, thiserror::Error)]
#[error("agent identity must not be empty")]
pub struct InvalidAgentId;

impl AgentId {
    /// Creates a new AgentId, returning an error if empty after trimming.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidAgentId> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(InvalidAgentId);
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_identity() {
        assert!(AgentId::new("").is_err());
        assert!(AgentId::new("   ").is_err());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let id = AgentId::new(" agent7 ").unwrap();
        assert_eq!(id.as_str(), "agent7");
    }
}
