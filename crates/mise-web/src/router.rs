//! Axum routers — map URL paths to handlers for both servers.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    cooking::cooking_query,
    docs::{api_docs, health},
    ui::{ui_page, ui_submit},
};
use crate::state::{AppState, SharedState, SharedUiState, UiState};

/// Build the JSON API router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/cooking/query", post(cooking_query))
        .route("/docs",          get(api_docs))
        .route("/health",        get(health))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Build the browser UI router.
pub fn build_ui_router(state: UiState) -> Router {
    let shared: SharedUiState = Arc::new(state);

    Router::new()
        .route("/", get(ui_page).post(ui_submit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
