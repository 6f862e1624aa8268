use thiserror::Error;

#[derive(Debug, Error)]
pub enum CookingError {
    /// The request itself is unusable; never reaches the model.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("LLM call failed: {0}")]
    Upstream(String),

    /// The model produced a recipe that fails validation.
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    #[error("Recipe search failed: {0}")]
    Search(String),

    #[error("Response generation failed: model returned no content")]
    EmptyResponse,

    #[error("Prompt rendering failed: {0}")]
    Prompt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CookingError {
    /// True when the caller sent something wrong, as opposed to a failure
    /// further down the pipeline.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CookingError::InvalidQuery(_))
    }
}

pub type Result<T> = std::result::Result<T, CookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_query_errors_are_client_errors() {
        assert!(CookingError::InvalidQuery("empty".into()).is_client_error());
        assert!(!CookingError::InvalidRecipe("servings".into()).is_client_error());
        assert!(!CookingError::Upstream("503".into()).is_client_error());
    }
}
