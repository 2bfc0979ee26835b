//! Configuration management for the taskdesk client.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default API base URL (can be overridden at compile time via TASK_API_BASE_URL env var).
pub const DEFAULT_API_BASE_URL: &str = match option_env!("TASK_API_BASE_URL") {
    Some(url) => url,
    None => "http://127.0.0.1:8000/api/",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const API_BASE_URL_ENV: &str = "TASK_API_BASE_URL";
const LOG_LEVEL_ENV: &str = "TASKDESK_LOG_LEVEL";

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Base URL every API path is resolved against.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Upper bound for a single token refresh call, in seconds.
    /// Absent means the refresh waits as long as the transport does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_timeout_secs: Option<u64>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            refresh_timeout_secs: None,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an environment lookup. Blank values are ignored.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = non_empty(API_BASE_URL_ENV) {
            self.api_base_url = url;
        }
        if let Some(level) = non_empty(LOG_LEVEL_ENV) {
            self.log_level = level;
        }
    }

    /// Get the API base URL as a parsed URL.
    ///
    /// The path always ends with `/` so that relative endpoint paths are
    /// joined beneath it instead of replacing its last segment.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        let mut url = Url::parse(&self.api_base_url).map_err(CoreError::from)?;
        if url.cannot_be_a_base() {
            return Err(CoreError::Config(format!(
                "API base URL cannot be used as a base: {}",
                self.api_base_url
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Refresh timeout as a duration, if configured.
    pub fn refresh_timeout(&self) -> Option<Duration> {
        self.refresh_timeout_secs.map(Duration::from_secs)
    }
}
