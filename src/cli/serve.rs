// src/cli/serve.rs
// `serve`: start the stand-in SRI Testing service

use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;

use crate::config::Settings;
use crate::web::{self, state::AppState};

pub async fn run_server(settings: &Settings, canned: bool, step: Option<u8>) -> Result<()> {
    let step = step.filter(|s| (1..=100).contains(s)).unwrap_or(settings.progress_step);
    let state = if canned {
        AppState::canned(step)?
    } else {
        AppState::new(step)?
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    info!(port = settings.port, step, canned, "Starting stand-in service");
    println!("SRI Testing stand-in running on http://localhost:{}", settings.port);

    web::serve(addr, state).await?;
    Ok(())
}
