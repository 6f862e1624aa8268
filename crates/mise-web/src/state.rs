//! Shared application state for the two servers.

use std::sync::Arc;
use std::time::Duration;

use minijinja::Environment;
use mise_agent::CookingWorkflow;

use crate::handlers::ui::BackendClient;

/// Shared state injected into every API handler. Immutable after startup.
pub struct AppState {
    pub workflow: Arc<CookingWorkflow>,
}

impl AppState {
    pub fn new(workflow: CookingWorkflow) -> Self {
        Self { workflow: Arc::new(workflow) }
    }
}

pub type SharedState = Arc<AppState>;

/// State for the browser UI: where the API lives and the page templates.
pub struct UiState {
    pub backend: BackendClient,
    pub templates: Environment<'static>,
}

impl UiState {
    pub fn new(backend_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut templates = Environment::new();
        templates.add_template("index.html", include_str!("../templates/index.html"))?;
        Ok(Self { backend: BackendClient::new(backend_url, client), templates })
    }
}

pub type SharedUiState = Arc<UiState>;
