//! POST /cooking/query — run the cooking workflow for one question.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use mise_common::{CookingQuery, CookingResponse};

use crate::error::ApiError;
use crate::state::SharedState;

pub async fn cooking_query(
    State(state): State<SharedState>,
    payload: Result<Json<CookingQuery>, JsonRejection>,
) -> Result<Json<CookingResponse>, ApiError> {
    let Json(query) = payload?;
    tracing::info!(chars = query.query.chars().count(), "Received cooking query");

    let response = state.workflow.answer(&query).await?;
    tracing::info!(
        relevant = response.relevant,
        steps = response.reasoning_chain.len(),
        "Cooking query answered"
    );
    Ok(Json(response))
}
