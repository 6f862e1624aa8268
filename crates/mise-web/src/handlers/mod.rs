//! HTTP handlers for all web routes.

pub mod cooking;
pub mod docs;
pub mod ui;
