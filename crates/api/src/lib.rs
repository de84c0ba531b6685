//! `api` crate — HTTP layer over the flowchart editor.
//!
//! Exposes:
//!   POST /generate_sql       natural language → SQL, steps and flowchart
//!   POST /update_flowchart   replace the flowchart from steps, regenerate SQL
//!   POST /add_step           append a step, regenerate SQL
//!   POST /update_step        edit a step's text/type, regenerate SQL
//!   POST /remove_step        delete a step, regenerate SQL
//!   GET  /flowchart          current flowchart snapshot
//!   GET  /health

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use flowchart::FlowEditor;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;

/// Context handed to every handler. Owns the editor (and through it the
/// flowchart and the translation gateway) instead of process-wide globals.
#[derive(Clone)]
pub struct AppState {
    pub editor: Arc<FlowEditor>,
}

impl AppState {
    pub fn new(editor: FlowEditor) -> Self {
        Self { editor: Arc::new(editor) }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    use handlers::{chart, health};

    Router::new()
        .route("/generate_sql", post(chart::generate_sql))
        .route("/update_flowchart", post(chart::update_flowchart))
        .route("/add_step", post(chart::add_step))
        .route("/update_step", post(chart::update_step))
        .route("/remove_step", post(chart::remove_step))
        .route("/flowchart", get(chart::current))
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `bind` and serve until the process is stopped.
pub async fn serve(bind: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
