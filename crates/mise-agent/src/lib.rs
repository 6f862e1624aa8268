//! mise-agent — the cooking assistant's answering pipeline.
//!
//!   - config:   `mise.toml` + environment overrides
//!   - prompts:  prompt templates for every model call
//!   - tools:    recipe research over the web
//!   - workflow: classify → check research → research → parse → respond

pub mod config;
pub mod prompts;
pub mod tools;
pub mod workflow;

pub use config::Config;
pub use workflow::{CookingWorkflow, WorkflowSettings};
