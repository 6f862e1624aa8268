//! Browser UI: a question form that forwards to the API server and renders
//! the answer with its reasoning chain.

use axum::{extract::State, http::StatusCode, response::Html, Form};
use minijinja::{context, Environment};
use mise_common::CookingResponse;
use serde::Deserialize;
use thiserror::Error;

use crate::state::SharedUiState;

pub const EMPTY_QUERY_WARNING: &str = "Please enter a question!";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Could not connect to backend at {0}")]
    Connect(String),

    #[error("Error communicating with backend: {0}")]
    Request(String),
}

/// HTTP client for the API server's `/cooking/query` endpoint.
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self { base_url: base_url.into(), client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> String {
        format!("{}/cooking/query", self.base_url.trim_end_matches('/'))
    }

    /// Send one question. A 502 carrying an answer-shaped body is returned
    /// as a normal answer.
    pub async fn ask(&self, query: &str) -> Result<CookingResponse, BackendError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    BackendError::Connect(self.base_url.clone())
                } else if e.is_timeout() {
                    BackendError::Request("request timed out".to_string())
                } else {
                    BackendError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        if status.is_success() || status == reqwest::StatusCode::BAD_GATEWAY {
            if let Ok(answer) = serde_json::from_str::<CookingResponse>(&body) {
                return Ok(answer);
            }
        }

        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["error"].as_str().map(String::from))
            .unwrap_or(body);
        Err(BackendError::Request(format!("{status}: {detail}")))
    }
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub query: String,
}

/// What the page shows below the form.
#[derive(Debug)]
pub enum PageView {
    Blank,
    Warning(&'static str),
    Answer(CookingResponse),
    ConnectError(String),
    Error(String),
}

pub async fn ui_page(State(state): State<SharedUiState>) -> Result<Html<String>, StatusCode> {
    render(&state.templates, "", &PageView::Blank)
}

pub async fn ui_submit(
    State(state): State<SharedUiState>,
    Form(form): Form<AskForm>,
) -> Result<Html<String>, StatusCode> {
    let query = form.query.trim();
    if query.is_empty() {
        return render(&state.templates, "", &PageView::Warning(EMPTY_QUERY_WARNING));
    }

    let view = match state.backend.ask(query).await {
        Ok(answer) => PageView::Answer(answer),
        Err(BackendError::Connect(url)) => {
            tracing::warn!(backend = %url, "Backend unreachable");
            PageView::ConnectError(url)
        }
        Err(e) => {
            tracing::warn!("Backend request failed: {}", e);
            PageView::Error(e.to_string())
        }
    };
    render(&state.templates, query, &view)
}

fn render(env: &Environment<'static>, query: &str, view: &PageView) -> Result<Html<String>, StatusCode> {
    render_page(env, query, view).map(Html).map_err(|e| {
        tracing::error!("Failed to render UI page: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub fn render_page(env: &Environment<'static>, query: &str, view: &PageView) -> Result<String, minijinja::Error> {
    let template = env.get_template("index.html")?;
    match view {
        PageView::Blank => template.render(context! { query }),
        PageView::Warning(warning) => template.render(context! { query, warning }),
        PageView::Answer(answer) => template.render(context! {
            query,
            answer => &answer.response,
            steps => &answer.reasoning_chain,
        }),
        PageView::ConnectError(url) => template.render(context! {
            query,
            connect_error => BackendError::Connect(url.clone()).to_string(),
            backend_url => url,
        }),
        PageView::Error(error) => template.render(context! { query, error }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::state::UiState;

    fn env() -> Environment<'static> {
        UiState::new("http://localhost:8000", Duration::from_secs(1))
            .unwrap()
            .templates
    }

    #[test]
    fn test_blank_page_has_form() {
        let html = render_page(&env(), "", &PageView::Blank).unwrap();
        assert!(html.contains("<form"));
        assert!(html.contains("name=\"query\""));
        assert!(!html.contains("See reasoning chain"));
    }

    #[test]
    fn test_steps_are_numbered_from_one_in_order() {
        let answer = CookingResponse::new(
            "Boil it.",
            true,
            vec!["first".to_string(), "second".to_string()],
        );
        let html = render_page(&env(), "pasta?", &PageView::Answer(answer)).unwrap();
        let one = html.find("Step 1: first").unwrap();
        let two = html.find("Step 2: second").unwrap();
        assert!(one < two);
        assert!(html.contains("See reasoning chain"));
    }

    #[test]
    fn test_empty_chain_message() {
        let answer = CookingResponse {
            response: "Boil it.".to_string(),
            relevant: true,
            reasoning_chain: Vec::new(),
        };
        let html = render_page(&env(), "pasta?", &PageView::Answer(answer)).unwrap();
        assert!(html.contains("No reasoning chain available"));
    }

    #[test]
    fn test_model_text_is_escaped() {
        let answer = CookingResponse::new(
            "<script>alert(1)</script>",
            true,
            vec!["<b>step</b>".to_string()],
        );
        let html = render_page(&env(), "<i>q</i>", &PageView::Answer(answer)).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&lt;b&gt;step&lt;"));
        assert!(!html.contains("<i>q</i>"));
    }

    #[test]
    fn test_connect_error_names_backend() {
        let html = render_page(
            &env(),
            "pasta?",
            &PageView::ConnectError("http://api:8000".to_string()),
        )
        .unwrap();
        // minijinja escapes '/' as well, so only match the host part.
        assert!(html.contains("Could not connect to backend at http:"));
        assert!(html.contains("api:8000"));
        assert!(html.contains("Troubleshooting"));
    }

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let client = BackendClient::new("http://api:8000/", reqwest::Client::new());
        assert_eq!(client.endpoint(), "http://api:8000/cooking/query");
        assert_eq!(client.base_url(), "http://api:8000/");
    }
}
