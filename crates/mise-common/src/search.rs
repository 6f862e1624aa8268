//! Research seam shared by the workflow and its test doubles.

use async_trait::async_trait;

use crate::error::CookingError;

/// Looks up recipe text for a query.
#[async_trait]
pub trait RecipeSearch: Send + Sync {
    /// Return at most `max_results` non-empty text snippets.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, CookingError>;

    fn name(&self) -> &str;
}
