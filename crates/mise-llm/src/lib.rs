//! mise-llm — LLM backend abstraction layer.
//! Implements the LlmBackend trait over OpenAI-style chat completion APIs
//! and the audit wrapper that records every call.

pub mod backend;
pub mod audit;

pub use audit::{AuditedBackend, LlmAuditEntry};
pub use backend::{
    http_client, LlmBackend, LlmError, LlmRequest, LlmResponse, Message, OllamaBackend,
    OpenAiBackend, OpenAiCompatibleBackend,
};
