//! Configuration and settings management
//!
//! Loads settings from config files and environment variables. Session and
//! prompt timeouts are defaults here rather than compile-time constants, so
//! deployments can tune them without a rebuild.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application settings loaded from files and environment variables.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Idle seconds before a viewer session decays
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,

    /// Seconds a numeric-jump prompt waits for a reply
    #[serde(default = "default_prompt_timeout_secs")]
    pub prompt_timeout_secs: u64,

    /// Character budget per paginated page
    #[serde(default = "default_page_max_size")]
    pub page_max_size: usize,

    /// Propagate soft transport failures instead of logging them
    /// (debugging aid; maps to the session's strict execution mode)
    #[serde(default)]
    pub strict_handlers: bool,
}

const fn default_session_timeout_secs() -> u64 {
    120
}

const fn default_prompt_timeout_secs() -> u64 {
    30
}

const fn default_page_max_size() -> usize {
    1900
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or `telegram_token` is
    /// missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Environment::default() auto-converts UPPER_SNAKE_CASE to
            // snake_case; ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    #[must_use]
    pub const fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    #[must_use]
    pub const fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_secs)
    }
}
