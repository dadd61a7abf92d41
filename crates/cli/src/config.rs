//! CLI configuration
//!
//! Settings are layered from built-in defaults, an optional TOML file and
//! `QUESTSCRIBE_*` environment variables (`QUESTSCRIBE_API__BASE_URL`, ...).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the data directory when `--config` is not given
pub const CONFIG_FILE_NAME: &str = "questscribe.toml";

pub const DEFAULT_BASE_URL: &str = "http://localhost:5095/api";

/// Environment variable overriding the data directory
pub const STATE_DIR_ENV: &str = "QUESTSCRIBE_STATE_DIR";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub health: HealthSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    /// Per-request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,
    /// Refresh tokens expiring within this many seconds
    pub refresh_lookahead_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthSettings {
    #[serde(default)]
    pub services: Vec<ServiceEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceEndpoint {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Number of recent submissions kept while playing
    pub history_window: usize,
}

impl Settings {
    /// Load settings for a data directory.
    ///
    /// An explicit config file must exist; the data directory's
    /// `questscribe.toml` is optional.
    pub fn load(data_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(data_dir.join(CONFIG_FILE_NAME)).required(false),
        };

        let settings = config::Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("api.timeout_secs", 30_u64)?
            .set_default("api.refresh_lookahead_secs", 30_u64 * 60)?
            .set_default(
                "session.history_window",
                questscribe_core::history::DEFAULT_WINDOW_SIZE as u64,
            )?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("QUESTSCRIBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.api.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn refresh_lookahead(&self) -> Duration {
        Duration::from_secs(self.api.refresh_lookahead_secs)
    }

    /// Services probed by `health`; the API itself when none are configured
    pub fn health_services(&self) -> Vec<(String, String)> {
        if self.health.services.is_empty() {
            return vec![("Backend API".to_string(), self.api.base_url.clone())];
        }
        self.health
            .services
            .iter()
            .map(|s| (s.name.clone(), s.url.clone()))
            .collect()
    }
}

/// Resolve the data directory: flag, then environment, then the platform default
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        if let Ok(state_dir) = std::env::var(STATE_DIR_ENV) {
            PathBuf::from(state_dir)
        } else {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("questscribe")
        }
    })
}
