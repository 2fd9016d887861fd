//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `DIALBRIDGE` prefix and nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use dialbridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod dialer;
mod error;
mod server;

pub use dialer::DialerConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream dialer configuration
    #[serde(default)]
    pub dialer: DialerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `DIALBRIDGE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DIALBRIDGE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `DIALBRIDGE__DIALER__BASE_URL=...` -> `dialer.base_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DIALBRIDGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.dialer.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Whether diagnostic snippets may be attached to error payloads.
    /// Never in production, and only when the dialer debug flag is set.
    pub fn diagnostics_allowed(&self) -> bool {
        self.dialer.debug && !self.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("DIALBRIDGE__SERVER__PORT");
        env::remove_var("DIALBRIDGE__SERVER__ENVIRONMENT");
        env::remove_var("DIALBRIDGE__DIALER__BASE_URL");
        env::remove_var("DIALBRIDGE__DIALER__API_USER");
        env::remove_var("DIALBRIDGE__DIALER__API_PASS");
        env::remove_var("DIALBRIDGE__DIALER__DEBUG");
    }

    #[test]
    fn loads_with_no_environment_at_all() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().expect("defaults should load");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.dialer.base_url(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_nested_dialer_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("DIALBRIDGE__DIALER__BASE_URL", "http://10.0.0.5/");
        env::set_var("DIALBRIDGE__DIALER__API_USER", "apiuser");
        env::set_var("DIALBRIDGE__DIALER__API_PASS", "apipass");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.dialer.base_url(), Some("http://10.0.0.5"));
        assert_eq!(config.dialer.api_credentials(), Some(("apiuser", "apipass")));
    }

    #[test]
    fn diagnostics_never_allowed_in_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("DIALBRIDGE__SERVER__ENVIRONMENT", "production");
        env::set_var("DIALBRIDGE__DIALER__DEBUG", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.dialer.debug);
        assert!(!config.diagnostics_allowed());
    }
}
