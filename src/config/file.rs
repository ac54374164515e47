// src/config/file.rs
// File-based configuration from ~/.sri-dashboard/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level config structure
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct DashboardConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub poll: PollSection,
    #[serde(default)]
    pub server: ServerSection,
}

/// `[api]` section
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct ApiSection {
    /// Base URL of the SRI Testing service
    pub url: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// `[poll]` section
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct PollSection {
    pub interval_ms: Option<u64>,
    pub max_polls: Option<u32>,
}

/// `[server]` section, for `serve`
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct ServerSection {
    pub port: Option<u16>,
    /// Percent added per status poll by the simulated runs
    pub progress_step: Option<u8>,
}

impl DashboardConfig {
    /// Load config from ~/.sri-dashboard/config.toml
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path; a missing or broken file yields defaults
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sri-dashboard")
            .join("config.toml")
    }
}
