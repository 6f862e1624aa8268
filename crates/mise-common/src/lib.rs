//! mise-common — Shared types, errors, and traits used across all Mise crates.

pub mod error;
pub mod models;
pub mod search;

// Re-export commonly used types
pub use error::{CookingError, Result};
pub use models::{AgentState, CookingQuery, CookingResponse, Difficulty, KitchenToolSet, Recipe};
pub use search::RecipeSearch;
