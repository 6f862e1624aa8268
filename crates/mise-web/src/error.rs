//! Mapping of pipeline failures onto HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mise_common::{CookingError, CookingResponse};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Cooking(#[from] CookingError),

    #[error("{0}")]
    Body(#[from] JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Body(rejection) => {
                let status = rejection.status();
                tracing::warn!(status = status.as_u16(), "Rejected request body: {}", rejection.body_text());
                (status, Json(json!({ "error": rejection.body_text() }))).into_response()
            }
            ApiError::Cooking(e) if e.is_client_error() => {
                tracing::warn!("Rejected query: {}", e);
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": e.to_string() }))).into_response()
            }
            ApiError::Cooking(e) => {
                let status = match &e {
                    CookingError::Upstream(_)
                    | CookingError::EmptyResponse
                    | CookingError::Search(_)
                    | CookingError::InvalidRecipe(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                tracing::error!(status = status.as_u16(), "Error processing cooking query: {}", e);
                // Keep the answer shape so the UI can still render something.
                (status, Json(CookingResponse::failure(e.to_string()))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let status = |e: CookingError| ApiError::from(e).into_response().status();
        assert_eq!(status(CookingError::InvalidQuery("empty".into())), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status(CookingError::InvalidRecipe("servings".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(CookingError::Upstream("503".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(CookingError::Config("no key".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
