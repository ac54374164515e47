// src/main.rs
// sri-dashboard - terminal client and stand-in server for SRI Testing runs

use anyhow::Result;
use clap::Parser;
use sri_dashboard::cli::{self, Cli};
use sri_dashboard::config::{DashboardConfig, EnvConfig, Settings};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (global first, then the working directory)
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".sri-dashboard/.env"));
    }
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let env = EnvConfig::from_env();

    let log_level = if cli.global.verbose {
        Level::DEBUG
    } else {
        env.log
            .as_deref()
            .and_then(|l| Level::from_str(l).ok())
            .unwrap_or_else(|| cli.command.default_log_level())
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let port = match &cli.command {
        cli::Commands::Serve { port, .. } => *port,
        _ => None,
    };
    let settings = Settings::resolve(&cli.global.overrides(port), &env, &DashboardConfig::load());

    cli::dispatch(&cli.global, cli.command, &settings).await
}
