//! Audit logging for LLM calls.
//!
//! Entries are emitted as structured tracing events under the
//! `mise::audit` target; nothing is stored.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::backend::{LlmBackend, LlmError, LlmRequest, LlmResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuditEntry {
    pub id: Uuid,
    pub model: String,
    pub is_local: bool,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl LlmAuditEntry {
    pub fn new(
        model: String,
        is_local: bool,
        prompt_tokens: u32,
        completion_tokens: u32,
        output: &str,
        latency_ms: u64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(output.as_bytes());
        let output_hash = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4(),
            model,
            is_local,
            prompt_tokens,
            completion_tokens,
            output_hash,
            latency_ms,
            called_at: Utc::now(),
        }
    }

    fn emit(&self) {
        tracing::info!(
            target: "mise::audit",
            id = %self.id,
            model = %self.model,
            is_local = self.is_local,
            prompt_tokens = self.prompt_tokens,
            completion_tokens = self.completion_tokens,
            output_hash = %self.output_hash,
            latency_ms = self.latency_ms,
            "LLM call completed"
        );
    }
}

/// Wraps a backend and audits every completion it serves.
pub struct AuditedBackend<B> {
    inner: B,
}

impl<B: LlmBackend> AuditedBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<B: LlmBackend> LlmBackend for AuditedBackend<B> {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let started = Instant::now();
        let result = self.inner.complete(req).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(resp) => LlmAuditEntry::new(
                resp.model.clone(),
                self.inner.is_local(),
                resp.prompt_tokens,
                resp.completion_tokens,
                &resp.content,
                latency_ms,
            )
            .emit(),
            Err(e) => tracing::warn!(
                target: "mise::audit",
                model = self.inner.model_id(),
                latency_ms,
                error = %e,
                "LLM call failed"
            ),
        }
        result
    }

    fn model_id(&self) -> &str { self.inner.model_id() }
    fn is_local(&self) -> bool { self.inner.is_local() }
}
