//! Scripted backend for tests
//!
//! Replays canned replies instead of calling a provider. Replies can be queued per
//! template field so concurrent field pipelines get deterministic answers regardless
//! of scheduling order. Every invocation is recorded for later assertions.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};

type Reply = Result<String, LlmError>;

#[derive(Default)]
struct Script {
    per_field: HashMap<String, VecDeque<Reply>>,
    fallback: Option<String>,
}

/// A backend that answers from a script
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
    invocations: Mutex<Vec<LlmInvocation>>,
    delays: HashMap<String, Duration>,
    completed: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every invocation that has no queued reply with `text`
    #[must_use]
    pub fn always(self, text: impl Into<String>) -> Self {
        lock(&self.script).fallback = Some(text.into());
        self
    }

    /// Queue a reply consumed by the next invocation for `field`
    #[must_use]
    pub fn reply_for(self, field: &str, text: impl Into<String>) -> Self {
        lock(&self.script)
            .per_field
            .entry(field.to_string())
            .or_default()
            .push_back(Ok(text.into()));
        self
    }

    /// Queue a failure consumed by the next invocation for `field`
    #[must_use]
    pub fn fail_for(self, field: &str, error: LlmError) -> Self {
        lock(&self.script)
            .per_field
            .entry(field.to_string())
            .or_default()
            .push_back(Err(error));
        self
    }

    /// Delay every invocation for `field` before answering
    #[must_use]
    pub fn delay_for(mut self, field: &str, delay: Duration) -> Self {
        self.delays.insert(field.to_string(), delay);
        self
    }

    /// Number of invocations received (including ones still in flight)
    pub fn call_count(&self) -> usize {
        lock(&self.invocations).len()
    }

    /// Number of invocations that ran to completion
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Snapshot of every invocation received so far
    pub fn invocations(&self) -> Vec<LlmInvocation> {
        lock(&self.invocations).clone()
    }

    /// Invocations received for `field`
    pub fn invocations_for(&self, field: &str) -> Vec<LlmInvocation> {
        lock(&self.invocations)
            .iter()
            .filter(|inv| inv.field == field)
            .cloned()
            .collect()
    }

    fn next_reply(&self, field: &str) -> Reply {
        let mut script = lock(&self.script);
        if let Some(reply) = script.per_field.get_mut(field).and_then(VecDeque::pop_front) {
            return reply;
        }
        script.fallback.clone().ok_or_else(|| {
            LlmError::InvalidResponse(format!("script exhausted for field '{field}'"))
        })
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let field = inv.field.clone();
        let model = inv.model.clone();
        lock(&self.invocations).push(inv);

        if let Some(delay) = self.delays.get(&field) {
            tokio::time::sleep(*delay).await;
        }

        let reply = self.next_reply(&field);
        self.completed.fetch_add(1, Ordering::SeqCst);
        reply.map(|text| LlmResult::new(text, "scripted", model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn inv(field: &str) -> LlmInvocation {
        LlmInvocation::new(
            "1",
            field,
            "m",
            Duration::from_secs(1),
            vec![Message::user("p")],
        )
    }

    #[tokio::test]
    async fn test_per_field_replies_then_fallback() {
        let backend = ScriptedBackend::new()
            .reply_for("complain", "cough")
            .reply_for("complain", "fever")
            .always("NA");

        assert_eq!(backend.invoke(inv("complain")).await.unwrap().raw_response, "cough");
        assert_eq!(backend.invoke(inv("complain")).await.unwrap().raw_response, "fever");
        assert_eq!(backend.invoke(inv("complain")).await.unwrap().raw_response, "NA");
        assert_eq!(backend.call_count(), 3);
        assert_eq!(backend.invocations_for("complain").len(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let backend = ScriptedBackend::new();
        let err = backend.invoke(inv("x")).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let backend = ScriptedBackend::new().fail_for(
            "prescription",
            LlmError::ProviderQuota("429".to_string()),
        );
        let err = backend.invoke(inv("prescription")).await.unwrap_err();
        assert_eq!(err, LlmError::ProviderQuota("429".to_string()));
        assert_eq!(backend.completed_count(), 1);
    }
}
