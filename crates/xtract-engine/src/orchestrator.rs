//! Top-level entry point: normalize, look up the template, run the cascade.
//!
//! ```rust,no_run
//! use serde_json::json;
//! use xtract_engine::Orchestrator;
//! use xtract_engine::config::LlmConfig;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::from_config(&LlmConfig::default())?;
//! let response = orchestrator
//!     .invoke(&json!({
//!         "request_id": 1234,
//!         "in": {"transcript": [{"speaker": "Doctor", "message": "Hi"}], "language": "english"},
//!         "out": "soap_en"
//!     }))
//!     .await?;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use serde_json::Value;
use uuid::Uuid;

use crate::config::LlmConfig;
use crate::error::XtractError;
use crate::llm::{self, LlmBackend};
use crate::logging::{log_request_complete, log_request_error, log_request_start};
use crate::models::ModelSet;
use crate::request::{NormalizedRequest, normalize};
use crate::response::ExtractionResponse;
use crate::template::run_template;
use crate::templates::TemplateRegistry;

/// Runs extraction requests against a template registry and a model set.
///
/// Cheap to share behind an `Arc`; all methods take `&self` and hold no mutable
/// state, so concurrent requests are independent.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    models: ModelSet,
    registry: &'static TemplateRegistry,
}

impl Orchestrator {
    /// Orchestrator over the built-in templates
    pub fn new(models: ModelSet) -> Self {
        Self::with_registry(models, TemplateRegistry::builtin())
    }

    pub fn with_registry(models: ModelSet, registry: &'static TemplateRegistry) -> Self {
        Self { models, registry }
    }

    /// Bind a single backend to the three configured model profiles
    pub fn with_backend(config: &LlmConfig, backend: Arc<dyn LlmBackend>) -> Self {
        Self::new(ModelSet::from_config(config, backend))
    }

    /// Build the provider backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns `XtractError::Llm` when the backend cannot be built, most often
    /// because the API key environment variable is unset.
    pub fn from_config(config: &LlmConfig) -> Result<Self, XtractError> {
        let backend = llm::from_config(config)?;
        Ok(Self::with_backend(config, backend))
    }

    #[must_use]
    pub fn registry(&self) -> &'static TemplateRegistry {
        self.registry
    }

    #[must_use]
    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    /// Process one raw request body.
    ///
    /// # Errors
    ///
    /// - `MalformedInput` when the body does not have the request shape
    /// - `UnknownTemplate` when `out` names no registered template; no model is called
    /// - `Llm` when any provider call fails
    pub async fn invoke(&self, body: &Value) -> Result<ExtractionResponse, XtractError> {
        let request = normalize(body)?;
        self.invoke_request(&request).await
    }

    /// Process an already-normalized request.
    ///
    /// Each call gets a fresh run id. It tags the request's log records and every
    /// provider invocation, and comes back as [`ExtractionResponse::run_id`].
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::invoke`].
    pub async fn invoke_request(
        &self,
        request: &NormalizedRequest,
    ) -> Result<ExtractionResponse, XtractError> {
        let template = self.registry.get(&request.template)?;
        let label = request.request_label();
        let run_id = Uuid::new_v4();
        let run_label = run_id.to_string();

        log_request_start(&run_label, &label, template.name, template.fields.len());
        let started = Instant::now();

        match run_template(&self.models, request, template, run_id).await {
            Ok(response) => {
                log_request_complete(
                    &run_label,
                    &label,
                    template.name,
                    response.resolved_count(),
                    started.elapsed(),
                );
                Ok(response)
            }
            Err(err) => {
                log_request_error(
                    &run_label,
                    &label,
                    template.name,
                    &err.to_string(),
                    started.elapsed(),
                );
                Err(err)
            }
        }
    }

    /// Process several requests concurrently.
    ///
    /// All bodies are normalized and their templates resolved before any model is
    /// called. Responses come back in input order; the first failure fails the
    /// whole batch.
    ///
    /// # Errors
    ///
    /// The first error raised by any request.
    pub async fn batch(&self, bodies: &[Value]) -> Result<Vec<ExtractionResponse>, XtractError> {
        let requests = bodies
            .iter()
            .map(|body| {
                let request = normalize(body)?;
                self.registry.get(&request.template)?;
                Ok(request)
            })
            .collect::<Result<Vec<_>, XtractError>>()?;

        try_join_all(requests.iter().map(|request| self.invoke_request(request))).await
    }
}
