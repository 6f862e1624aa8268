//! Configuration loading for Mise.
//! Reads mise.toml from the current directory or the path in the MISE_CONFIG
//! env var, then applies environment overrides. Every field has a default,
//! so running without a file is fine.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mise_common::{CookingError, KitchenToolSet};
use mise_llm::{
    http_client, AuditedBackend, LlmBackend, OllamaBackend, OpenAiBackend, OpenAiCompatibleBackend,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::workflow::WorkflowSettings;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub ui: UiConfig,
    pub kitchen: KitchenConfig,
    pub research: ResearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
    #[serde(rename = "ollama")]
    Ollama,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: LlmProvider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    /// Never read from the file; comes from OPENAI_API_KEY.
    #[serde(skip)]
    pub api_key: Option<SecretString>,
}

fn default_provider()    -> LlmProvider { LlmProvider::OpenAi }
fn default_model()       -> String { "gpt-3.5-turbo".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens()  -> u32 { 1024 }
fn default_llm_timeout() -> u64 { 60 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            base_url: String::new(),
            timeout_secs: default_llm_timeout(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_api_bind")]
    pub bind: String,
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
}

fn default_api_bind()        -> String { "0.0.0.0:8000".to_string() }
fn default_max_query_chars() -> usize  { mise_common::models::DEFAULT_MAX_QUERY_CHARS }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_api_bind(), max_query_chars: default_max_query_chars() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_ui_bind")]
    pub bind: String,
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_ui_timeout")]
    pub request_timeout_secs: u64,
}

fn default_ui_bind()     -> String { "0.0.0.0:8501".to_string() }
fn default_backend_url() -> String { "http://localhost:8000".to_string() }
fn default_ui_timeout()  -> u64    { 30 }

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            bind: default_ui_bind(),
            backend_url: default_backend_url(),
            request_timeout_secs: default_ui_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenConfig {
    #[serde(default = "default_tools")]
    pub available_tools: Vec<String>,
}

fn default_tools() -> Vec<String> { KitchenToolSet::default().available_tools }

impl Default for KitchenConfig {
    fn default() -> Self {
        Self { available_tools: default_tools() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn bool_true()              -> bool  { true }
fn default_max_results()    -> usize { 3 }
fn default_search_timeout() -> u64   { 15 }

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            enabled: bool_true(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file, rolled daily next to the given path. Set to "" to log to
    /// stdout only.
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
}

fn default_log_file() -> Option<String> { Some("cooking_assistant.log".to_string()) }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { file: default_log_file() }
    }
}

impl LoggingConfig {
    pub fn log_file(&self) -> Option<&str> {
        self.file.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }
}


impl Config {
    /// Load configuration from mise.toml.
    /// Checks MISE_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("MISE_CONFIG")
            .unwrap_or_else(|_| "mise.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path, e))?
        } else {
            tracing::debug!(path = %path, "No config file found, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides on top of file values.
    /// Blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(SecretString::from(key));
        }
        if let Some(url) = get("BACKEND_URL") {
            self.ui.backend_url = url;
        }
        if let Some(bind) = get("MISE_API_BIND") {
            self.server.bind = bind;
        }
        if let Some(bind) = get("MISE_UI_BIND") {
            self.ui.bind = bind;
        }
    }

    pub fn toolset(&self) -> KitchenToolSet {
        KitchenToolSet::new(self.kitchen.available_tools.clone())
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            research_enabled: self.research.enabled,
            max_research_results: self.research.max_results,
            max_query_chars: self.server.max_query_chars,
        }
    }

    /// Build the configured LLM backend, wrapped for auditing.
    pub fn build_backend(&self) -> Result<Arc<dyn LlmBackend>, CookingError> {
        let llm = &self.llm;
        let client = http_client(Duration::from_secs(llm.timeout_secs))
            .map_err(|e| CookingError::Config(e.to_string()))?;

        let backend: Arc<dyn LlmBackend> = match llm.provider {
            LlmProvider::OpenAi => {
                let key = llm.api_key.clone().ok_or_else(|| {
                    CookingError::Config(
                        "OPENAI_API_KEY environment variable is not set".to_string(),
                    )
                })?;
                Arc::new(AuditedBackend::new(
                    OpenAiBackend::new(key, &llm.model).with_client(client),
                ))
            }
            LlmProvider::OpenAiCompatible => {
                let base_url = require_base_url(llm)?;
                Arc::new(AuditedBackend::new(
                    OpenAiCompatibleBackend::new(base_url, &llm.model, llm.api_key.clone())
                        .with_client(client),
                ))
            }
            LlmProvider::Ollama => {
                let base_url = if llm.base_url.trim().is_empty() {
                    "http://localhost:11434".to_string()
                } else {
                    llm.base_url.clone()
                };
                Arc::new(AuditedBackend::new(
                    OllamaBackend::new(base_url, &llm.model).with_client(client),
                ))
            }
        };
        Ok(backend)
    }
}

fn require_base_url(llm: &LlmConfig) -> Result<String, CookingError> {
    if llm.base_url.trim().is_empty() {
        return Err(CookingError::Config(
            "llm.base_url is required for the openai_compatible provider".to_string(),
        ));
    }
    Ok(llm.base_url.clone())
}
