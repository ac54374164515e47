// src/config/mod.rs
// Configuration: CLI flags over environment over config file over defaults

pub mod env;
pub mod file;

pub use env::EnvConfig;
pub use file::DashboardConfig;

use std::time::Duration;

use crate::client::{DEFAULT_POLL_INTERVAL, PollConfig};
use crate::http::DEFAULT_TIMEOUT;

pub const DEFAULT_API_URL: &str = "http://localhost:8090";
pub const DEFAULT_PORT: u16 = 8090;
pub const DEFAULT_PROGRESS_STEP: u8 = 50;

/// Fully resolved settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub timeout: Duration,
    pub poll: PollConfig,
    pub port: u16,
    pub progress_step: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            poll: PollConfig::default(),
            port: DEFAULT_PORT,
            progress_step: DEFAULT_PROGRESS_STEP,
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub poll_interval: Option<Duration>,
    pub max_polls: Option<u32>,
    pub port: Option<u16>,
}

impl Settings {
    /// Merge the layers; the first layer that sets a value wins
    pub fn resolve(cli: &Overrides, env: &EnvConfig, file: &DashboardConfig) -> Self {
        let progress_step = file
            .server
            .progress_step
            .filter(|s| (1..=100).contains(s))
            .unwrap_or(DEFAULT_PROGRESS_STEP);

        Self {
            api_url: cli
                .api_url
                .clone()
                .or_else(|| env.api_url.clone())
                .or_else(|| file.api.url.clone())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout: file
                .api
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            poll: PollConfig {
                interval: cli
                    .poll_interval
                    .or(env.poll_interval)
                    .or(file.poll.interval_ms.map(Duration::from_millis))
                    .unwrap_or(DEFAULT_POLL_INTERVAL),
                max_polls: cli.max_polls.or(env.max_polls).or(file.poll.max_polls),
            },
            port: cli
                .port
                .or(env.port)
                .or(file.server.port)
                .unwrap_or(DEFAULT_PORT),
            progress_step,
        }
    }
}
