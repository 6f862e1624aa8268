//! mise-web — HTTP surfaces for Mise.
//! Provides two servers:
//!   - the JSON API (`POST /cooking/query`, `/docs`, `/health`)
//!   - the browser UI that posts questions to the API and renders answers

pub mod error;
pub mod handlers;
pub mod router;
pub mod shutdown;
pub mod state;
pub mod telemetry;
