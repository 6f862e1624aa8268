//! GET /docs and GET /health.

use axum::{extract::State, response::Html, Json};
use serde_json::{json, Value};

use crate::state::SharedState;

const DOCS_HTML: &str = include_str!("../../templates/docs.html");

/// Human-readable API reference. Also the target of the container health check.
pub async fn api_docs() -> Html<&'static str> {
    Html(DOCS_HTML)
}

pub async fn health(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.workflow.model_id(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
