//! Tools the workflow calls besides the model itself.
//! Only recipe research lives here today.

pub mod search;

pub use mise_common::RecipeSearch;
pub use search::DuckDuckGoSearch;
