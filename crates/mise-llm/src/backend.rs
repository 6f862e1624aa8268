//! LLM backend trait and concrete implementations.
//!
//! Backends:
//!   OpenAiBackend           — OpenAI API (gpt-3.5-turbo, gpt-4o-mini, …)
//!   OpenAiCompatibleBackend — any OpenAI-compatible endpoint (LMStudio,
//!                             TogetherAI, Groq, OpenRouter, vLLM, …)
//!   OllamaBackend           — local Ollama (OpenAI-compatible)
//!
//! All three speak `/v1/chat/completions`; only the base URL and the
//! authentication differ.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

const OPENAI_BASE_URL: &str = "https://api.openai.com";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("Completion contained no choices")]
    EmptyCompletion,
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// Single-turn request carrying one user prompt.
    pub fn prompt(content: impl Into<String>) -> Self {
        Self { messages: vec![Message::user(content)], ..Default::default() }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    fn model_id(&self) -> &str;
    fn is_local(&self) -> bool;
}

/// Build the HTTP client shared by a backend. No retries are layered on top;
/// the timeout is the only bound on an upstream call.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("mise/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

// ── Helper: OpenAI-style wire format ─────────────────────────────────────────

fn completion_body(req: &LlmRequest, default_model: &str) -> serde_json::Value {
    serde_json::json!({
        "model":       req.model.as_deref().unwrap_or(default_model),
        "messages":    req.messages,
        "max_tokens":  req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "temperature": req.temperature.unwrap_or(DEFAULT_TEMPERATURE),
    })
}

fn parse_openai_response(json: &serde_json::Value, fallback_model: &str) -> Result<LlmResponse, LlmError> {
    let choice = json["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or(LlmError::EmptyCompletion)?;

    Ok(LlmResponse {
        content: choice["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        model: json["model"]
            .as_str()
            .unwrap_or(fallback_model)
            .to_string(),
        prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    })
}

fn api_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => json["error"]["message"]
            .as_str()
            .or_else(|| json["error"].as_str())
            .or_else(|| json["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string(),
        Err(_) if body.trim().is_empty() => format!("HTTP {status} with empty body"),
        Err(_) => body.trim().chars().take(300).collect(),
    }
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    if status >= 400 {
        return Err(LlmError::ApiError { status, message: api_error_message(status, &body) });
    }
    Ok(serde_json::from_str(&body)?)
}

// ── 1. OpenAI ─────────────────────────────────────────────────────────────────

pub struct OpenAiBackend {
    pub model: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self { model: model.into(), api_key, client: reqwest::Client::new() }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = completion_body(&req, &self.model);
        let resp = self.client
            .post(format!("{OPENAI_BASE_URL}/v1/chat/completions"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        parse_openai_response(&json, &self.model)
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { false }
}

// ── 2. OpenAI-Compatible (LMStudio, TogetherAI, Groq, OpenRouter, vLLM, …) ──

pub struct OpenAiCompatibleBackend {
    pub base_url: String,
    pub model: String,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(k) => req.bearer_auth(k.expose_secret()),
            None    => req,
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = completion_body(&req, &self.model);
        let resp = self.auth(self.client.post(&url)).json(&body).send().await?;
        let json = check_response_status(resp).await?;
        parse_openai_response(&json, &self.model)
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { false }
}

// ── 3. Ollama (local) ─────────────────────────────────────────────────────────

pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), model: model.into(), client: reqwest::Client::new() }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = completion_body(&req, &self.model);
        let resp = self.client.post(&url).json(&body).send().await?;
        let json = check_response_status(resp).await?;
        parse_openai_response(&json, &self.model)
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { true }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_openai_backend_is_not_local() {
        let b = OpenAiBackend::new(SecretString::from("sk-test"), "gpt-3.5-turbo");
        assert!(!b.is_local());
        assert_eq!(b.model_id(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_openai_compatible_with_no_key() {
        let b = OpenAiCompatibleBackend::new("http://localhost:1234", "local-model", None);
        // No API key is valid for LMStudio / vLLM
        assert_eq!(b.model_id(), "local-model");
    }

    #[test]
    fn test_ollama_is_local() {
        let b = OllamaBackend::new("http://localhost:11434", "llama3:8b");
        assert!(b.is_local());
    }

    #[test]
    fn test_request_defaults_fill_body() {
        let req = LlmRequest::prompt("Is toast cooking?");
        let body = completion_body(&req, "gpt-3.5-turbo");
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Is toast cooking?");

        let req = LlmRequest::prompt("x").with_temperature(0.0).with_max_tokens(8);
        let body = completion_body(&req, "m");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 8);
    }

    #[test]
    fn test_parse_openai_response() {
        let json = serde_json::json!({
            "model": "gpt-3.5-turbo-0125",
            "choices": [{ "message": { "role": "assistant", "content": "true" } }],
            "usage": { "prompt_tokens": 42, "completion_tokens": 1 }
        });
        let resp = parse_openai_response(&json, "fallback").unwrap();
        assert_eq!(resp.content, "true");
        assert_eq!(resp.model, "gpt-3.5-turbo-0125");
        assert_eq!(resp.prompt_tokens, 42);
        assert_eq!(resp.completion_tokens, 1);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let json = serde_json::json!({ "choices": [] });
        assert!(matches!(parse_openai_response(&json, "m"), Err(LlmError::EmptyCompletion)));
    }

    #[test]
    fn test_api_error_message_extraction() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(api_error_message(401, body), "Incorrect API key provided");
        assert_eq!(api_error_message(502, "Bad Gateway"), "Bad Gateway");
        assert_eq!(api_error_message(503, ""), "HTTP 503 with empty body");
    }

    // ── Local server round trips ──

    use axum::{http::{HeaderMap, StatusCode}, routing::post, Json, Router};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn fixed_reply(status: StatusCode, body: &'static str) -> String {
        serve(Router::new().route(
            "/v1/chat/completions",
            post(move || async move { (status, body) }),
        ))
        .await
    }

    #[tokio::test]
    async fn test_compatible_backend_sends_model_and_key() {
        let base_url = serve(Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string();
                let prompt = body["messages"][0]["content"].as_str().unwrap_or("").to_string();
                Json(serde_json::json!({
                    "model": body["model"].clone(),
                    "choices": [{ "message": { "content": format!("{prompt} | {auth}") } }],
                    "usage": { "prompt_tokens": 5, "completion_tokens": 2 }
                }))
            }),
        ))
        .await;

        let backend = OpenAiCompatibleBackend::new(
            format!("{base_url}/"),
            "local-model",
            Some(SecretString::from("sk-local")),
        );
        let resp = backend.complete(LlmRequest::prompt("Is soup cooking?")).await.unwrap();
        assert_eq!(resp.content, "Is soup cooking? | Bearer sk-local");
        assert_eq!(resp.model, "local-model");
        assert_eq!(resp.prompt_tokens, 5);
    }

    #[tokio::test]
    async fn test_non_success_status_becomes_api_error() {
        let base_url = fixed_reply(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"error": {"message": "model overloaded"}}"#,
        )
        .await;

        let backend = OpenAiCompatibleBackend::new(base_url, "m", None);
        match backend.complete(LlmRequest::prompt("q")).await {
            Err(LlmError::ApiError { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "model overloaded");
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_without_choices_is_empty_completion() {
        let base_url = fixed_reply(StatusCode::OK, r#"{"model": "m", "choices": []}"#).await;

        let backend = OllamaBackend::new(base_url, "llama3:8b");
        let err = backend.complete(LlmRequest::prompt("q")).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_success_with_invalid_json_is_serde_error() {
        let base_url = fixed_reply(StatusCode::OK, "<html>not json</html>").await;

        let backend = OpenAiCompatibleBackend::new(base_url, "m", None);
        let err = backend.complete(LlmRequest::prompt("q")).await.unwrap_err();
        assert!(matches!(err, LlmError::Serde(_)));
    }

    #[tokio::test]
    #[ignore] // Requires network access and OPENAI_API_KEY
    async fn test_openai_live_completion() {
        let key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let b = OpenAiBackend::new(SecretString::from(key), "gpt-3.5-turbo");
        let resp = b.complete(LlmRequest::prompt("Reply with the single word: true")).await.unwrap();
        assert!(!resp.content.is_empty());
    }
}
