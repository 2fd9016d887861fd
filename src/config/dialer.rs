//! Upstream dialer configuration

use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Upstream dialer configuration.
///
/// `base_url`, `api_user` and `api_pass` come from the deployment; leaving
/// them unset is legal at startup and surfaces as `CONFIG_MISSING` on the
/// first call that needs them.
#[derive(Debug, Clone, Deserialize)]
pub struct DialerConfig {
    /// Upstream base URL (e.g. http://10.20.0.5), no trailing slash.
    #[serde(default)]
    pub base_url: String,

    /// API user for agent-API and dial calls.
    #[serde(default)]
    pub api_user: String,

    /// API password for agent-API and dial calls.
    #[serde(default)]
    pub api_pass: Option<Secret<String>>,

    /// `source` tag sent with agent-API calls.
    #[serde(default = "default_source")]
    pub source: String,

    /// Connect-phase timeout for upstream calls, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Read-phase (whole request) timeout for upstream calls, in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Cookie session idle TTL, in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Bounded attempts when reconciling a dial with its lead.
    #[serde(default = "default_poll_attempts")]
    pub lead_poll_attempts: u32,

    /// Delay between lead reconciliation attempts, in milliseconds.
    #[serde(default = "default_poll_delay_ms")]
    pub lead_poll_delay_ms: u64,

    /// Convention for deriving the phone secret from the phone login.
    #[serde(default = "default_phone_pass_prefix")]
    pub phone_pass_prefix: String,

    /// When true (and not in production), error payloads carry truncated
    /// response snippets and masked request echoes.
    #[serde(default)]
    pub debug: bool,
}

impl DialerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn lead_poll_delay(&self) -> Duration {
        Duration::from_millis(self.lead_poll_delay_ms)
    }

    /// Base URL with any trailing slash removed; `None` when unset.
    pub fn base_url(&self) -> Option<&str> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    /// API credentials, or `None` when either half is unset.
    pub fn api_credentials(&self) -> Option<(&str, &str)> {
        let user = self.api_user.trim();
        let pass = self.api_pass.as_ref()?.expose_secret().as_str();
        if user.is_empty() || pass.is_empty() {
            return None;
        }
        Some((user, pass))
    }

    /// Derives the phone secret from a phone login.
    pub fn phone_pass_for(&self, phone_login: &str) -> String {
        format!("{}{}", self.phone_pass_prefix, phone_login)
    }

    /// Validate dialer configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(base) = self.base_url() {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(ValidationError::InvalidDialerBaseUrl);
            }
        }
        if self.connect_timeout_secs == 0 || self.read_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.session_ttl_secs == 0 {
            return Err(ValidationError::InvalidSessionTtl);
        }
        if self.lead_poll_attempts == 0 {
            return Err(ValidationError::InvalidPollBounds);
        }
        Ok(())
    }
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_user: String::new(),
            api_pass: None,
            source: default_source(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            session_ttl_secs: default_session_ttl(),
            lead_poll_attempts: default_poll_attempts(),
            lead_poll_delay_ms: default_poll_delay_ms(),
            phone_pass_prefix: default_phone_pass_prefix(),
            debug: false,
        }
    }
}

fn default_source() -> String {
    "dialbridge".to_string()
}

fn default_connect_timeout() -> u64 {
    8
}

fn default_read_timeout() -> u64 {
    12
}

fn default_session_ttl() -> u64 {
    1800
}

fn default_poll_attempts() -> u32 {
    5
}

fn default_poll_delay_ms() -> u64 {
    300
}

fn default_phone_pass_prefix() -> String {
    "anexo_".to_string()
}
