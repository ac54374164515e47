// src/cli/mod.rs
// Command-line front end for the SRI Testing dashboard

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

pub mod commands;
pub mod render;
pub mod serve;

pub use commands::dispatch;

use crate::config::Overrides;

#[derive(Parser)]
#[command(name = "sri-dashboard")]
#[command(about = "Run and inspect SRI Testing one-hop test runs")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Base URL of the SRI Testing service
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Answer from the built-in canned mock instead of the network
    #[arg(long, global = true)]
    pub mock: bool,

    /// Status poll interval in milliseconds
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Give up waiting after this many status polls
    #[arg(long, global = true)]
    pub max_polls: Option<u32>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn overrides(&self, port: Option<u16>) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            poll_interval: self.poll_interval_ms.map(Duration::from_millis),
            max_polls: self.max_polls,
            port,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a test run
    Run {
        /// TRAPI version to test against
        #[arg(long)]
        trapi_version: Option<String>,

        /// Biolink Model version to test against
        #[arg(long)]
        biolink_version: Option<String>,

        /// Worker data access timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Log level handed to the test harness (e.g. DEBUG)
        #[arg(long)]
        log: Option<String>,

        /// Poll until complete and print the summary
        #[arg(short, long)]
        wait: bool,
    },

    /// Show completion percentage of a run
    Status {
        run_id: String,
    },

    /// Print the summary report of a completed run
    Summary {
        run_id: String,

        /// Print the raw JSON document
        #[arg(long)]
        json: bool,

        /// List every failed unit test
        #[arg(long)]
        failures: bool,
    },

    /// Fetch the detail document of one unit test
    Details {
        /// KP or ARA
        component: String,
        /// Resource name (`kp` or `ara|kp`)
        resource: String,
        /// Unit test name (e.g. by_subject)
        test_id: String,
        /// Test case index
        idx: u32,

        /// Run to look in (default: the latest)
        #[arg(long)]
        run_id: Option<String>,
    },

    /// List known test runs
    List,

    /// Show the registry of testable resources
    Registry {
        /// Only KP or only ARA entries
        #[arg(long)]
        component: Option<String>,
    },

    /// Show the KP and ARA resources of a completed run
    Index {
        run_id: String,
    },

    /// Show the test cases of one resource of a completed run
    Resource {
        run_id: String,

        #[arg(long)]
        kp: Option<String>,

        #[arg(long)]
        ara: Option<String>,
    },

    /// Fetch the TRAPI response message behind one unit test of one edge
    Response {
        run_id: String,
        /// Edge number (test case index)
        edge_num: u32,
        /// Unit test name (e.g. by_subject)
        test_id: String,

        #[arg(long)]
        kp: Option<String>,

        #[arg(long)]
        ara: Option<String>,
    },

    /// Poll a run until it completes, then print its tally
    Watch {
        run_id: String,
    },

    /// Convert a legacy per-resource summary file into test cases
    Convert {
        path: PathBuf,
    },

    /// Run the stand-in SRI Testing service
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Every submission returns the canned mock run id
        #[arg(long)]
        canned: bool,

        /// Percent added per status poll
        #[arg(long)]
        step: Option<u8>,
    },
}

impl Commands {
    /// Log level when neither `--verbose` nor SRI_LOG says otherwise
    pub fn default_log_level(&self) -> Level {
        match self {
            Commands::Serve { .. } => Level::INFO,
            _ => Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_wait() {
        let cli = Cli::parse_from([
            "sri-dashboard",
            "--mock",
            "run",
            "--trapi-version",
            "1.3",
            "--wait",
        ]);
        assert!(cli.global.mock);
        match cli.command {
            Commands::Run { trapi_version, wait, .. } => {
                assert_eq!(trapi_version.as_deref(), Some("1.3"));
                assert!(wait);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["sri-dashboard", "status", "abc", "--api-url", "http://x", "-v"]);
        assert_eq!(cli.global.api_url.as_deref(), Some("http://x"));
        assert!(cli.global.verbose);
    }

    #[test]
    fn test_details_arguments() {
        let cli = Cli::parse_from(["sri-dashboard", "details", "ARA", "aragorn|test-kp-1", "by_subject", "2"]);
        match cli.command {
            Commands::Details { component, resource, idx, run_id, .. } => {
                assert_eq!(component, "ARA");
                assert_eq!(resource, "aragorn|test-kp-1");
                assert_eq!(idx, 2);
                assert_eq!(run_id, None);
            }
            _ => panic!("expected details"),
        }
    }

    #[test]
    fn test_response_arguments() {
        let cli = Cli::parse_from([
            "sri-dashboard",
            "response",
            "2023-13-32_24-61-61",
            "4",
            "by_object",
            "--ara",
            "aragorn",
            "--kp",
            "test-kp-1",
        ]);
        match cli.command {
            Commands::Response { edge_num, test_id, kp, ara, .. } => {
                assert_eq!(edge_num, 4);
                assert_eq!(test_id, "by_object");
                assert_eq!(kp.as_deref(), Some("test-kp-1"));
                assert_eq!(ara.as_deref(), Some("aragorn"));
            }
            _ => panic!("expected response"),
        }
    }

    #[test]
    fn test_serve_logs_at_info() {
        let cli = Cli::parse_from(["sri-dashboard", "serve", "--canned"]);
        assert_eq!(cli.command.default_log_level(), Level::INFO);
    }
}
