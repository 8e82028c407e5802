//! Invocation logging wrapper
//!
//! Wraps any `LlmBackend` and emits one structured record when an invocation starts
//! and one when it ends or fails. Both records carry the same `run_id`, so a log
//! query can pair every prompt with its response. `parent_run_id` names the
//! extraction run that issued the call.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use xtract_utils::redaction::redact_error_message;

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};

pub struct LoggedBackend {
    inner: Arc<dyn LlmBackend>,
}

impl LoggedBackend {
    pub fn new(inner: Arc<dyn LlmBackend>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LlmBackend for LoggedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let run_id = Uuid::new_v4();
        let tags = inv.tags.join(",");
        let request_id = inv.request_id.clone();
        let field = inv.field.clone();
        let parent_run_id = inv
            .parent_run_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        let started = Instant::now();

        info!(
            kind = "start",
            run_id = %run_id,
            parent_run_id = %parent_run_id,
            request_id = %request_id,
            field = %field,
            tags = %tags,
            model = %inv.model,
            prompt = inv.prompt().unwrap_or_default(),
            "LLM invocation started"
        );

        let result = self.inner.invoke(inv).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => {
                info!(
                    kind = "end",
                    run_id = %run_id,
                    parent_run_id = %parent_run_id,
                    request_id = %request_id,
                    field = %field,
                    tags = %tags,
                    model_used = %response.model_used,
                    tokens_input = ?response.tokens_input,
                    tokens_output = ?response.tokens_output,
                    duration_ms,
                    response = %response.raw_response,
                    "LLM invocation finished"
                );
            }
            Err(e) => {
                error!(
                    kind = "error",
                    run_id = %run_id,
                    parent_run_id = %parent_run_id,
                    request_id = %request_id,
                    field = %field,
                    tags = %tags,
                    duration_ms,
                    error = %redact_error_message(&e.to_string()),
                    "LLM invocation failed"
                );
            }
        }

        result
    }
}
