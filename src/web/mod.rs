// src/web/mod.rs
// Stand-in SRI Testing service for local development and end-to-end tests

pub mod api;
pub mod error;
pub mod state;
pub mod validate;

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::Result;
use crate::web::state::AppState;

/// Create the web server router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health))
        // Run lifecycle
        .route("/run_tests", post(api::run_tests))
        .route("/status/{run_id}", get(api::status))
        .route("/list", get(api::list))
        // Reports
        .route("/summary/{run_id}", get(api::summary))
        .route("/index/{run_id}", get(api::index))
        .route("/resource/{run_id}", get(api::resource))
        .route("/details/{component}/{resource}/{test_id}/{idx}", get(api::details))
        .route("/response", get(api::response))
        .route("/registry", get(api::registry))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "SRI Testing stand-in listening");
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
