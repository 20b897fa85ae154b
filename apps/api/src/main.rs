mod config;
mod errors;
mod intake;
mod interview;
mod models;
mod routes;
mod scoring;
mod state;
mod storage;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::engine::Engine;
use crate::interview::timer::CountdownTimers;
use crate::routes::build_router;
use crate::scoring::Grader;
use crate::state::AppState;
use crate::storage::JsonFileStore;

/// Resume uploads larger than this are rejected up front.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Snapshot store
    let store = Arc::new(JsonFileStore::new(PathBuf::from(&config.data_path)));
    info!("Session store: {}", config.data_path);

    // Grader: remote backend when a key is configured, local heuristics otherwise
    let grader = Grader::from_config(&config);
    match grader.remote_model() {
        Some(model) => info!("Grading backend configured (model: {model})"),
        None => info!("No grading backend configured; using local heuristics"),
    }

    // Engine, hydrated from the last snapshot
    let engine = Arc::new(Engine::new(store, grader, config.question_seed).await?);
    let timers = Arc::new(CountdownTimers::new());

    let state = AppState { engine, timers };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()) // TODO: tighten CORS in production
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
