// src/config/env.rs
// Environment-based configuration - every SRI_* variable is read here

use std::time::Duration;
use tracing::{debug, warn};

pub const API_URL_VAR: &str = "SRI_TESTING_API_URL";
pub const POLL_INTERVAL_VAR: &str = "SRI_POLL_INTERVAL_MS";
pub const MAX_POLLS_VAR: &str = "SRI_MAX_POLLS";
pub const PORT_VAR: &str = "SRI_DASHBOARD_PORT";
pub const LOG_VAR: &str = "SRI_LOG";

/// Settings supplied through environment variables; unset or blank means "not given"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Base URL of the SRI Testing service (SRI_TESTING_API_URL)
    pub api_url: Option<String>,
    /// Status poll interval (SRI_POLL_INTERVAL_MS)
    pub poll_interval: Option<Duration>,
    /// Poll budget for `--wait` and `watch` (SRI_MAX_POLLS)
    pub max_polls: Option<u32>,
    /// Port of the stand-in server (SRI_DASHBOARD_PORT)
    pub port: Option<u16>,
    /// Log filter directive (SRI_LOG)
    pub log: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let config = Self {
            api_url: read(API_URL_VAR).map(|u| u.trim().trim_end_matches('/').to_string()),
            poll_interval: parse_var(POLL_INTERVAL_VAR, read(POLL_INTERVAL_VAR))
                .map(Duration::from_millis),
            max_polls: parse_var(MAX_POLLS_VAR, read(MAX_POLLS_VAR)),
            port: parse_var(PORT_VAR, read(PORT_VAR)),
            log: read(LOG_VAR),
        };

        if let Some(url) = &config.api_url {
            debug!(api_url = %url, "API URL from environment");
        }
        config
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: Option<String>) -> Option<T> {
    let value = value?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(var = name, value = %value, "Ignoring unparseable environment variable");
            None
        }
    }
}
