//! Per-field pipeline: extract → validate → conditionally resolve
//!
//! ```text
//! start → extracted → validated ─┬─ Valid ───────────────→ resolved = extracted
//!                                └─ Invalid/Unrecognized → resolved = re-extract (resolve model)
//! ```
//!
//! At most two extraction calls and one validation call per field. The resolved
//! value is never validated again.

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::XtractError;
use crate::logging::log_unrecognized_verdict;
use crate::models::{InvocationScope, ModelRole, ModelSet};
use crate::prompt::PromptKind;
use crate::request::NormalizedRequest;
use crate::templates::FieldSpec;

/// Parsed validation output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The model answered exactly `true`
    Valid,
    /// The model answered exactly `false`
    Invalid,
    /// Anything else, kept verbatim
    Unrecognized(String),
}

impl Verdict {
    /// Exact match only; whitespace or case variants are `Unrecognized`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => Self::Valid,
            "false" => Self::Invalid,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    #[must_use]
    pub fn needs_resolution(&self) -> bool {
        !matches!(self, Self::Valid)
    }
}

/// Everything computed for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldResult {
    pub field: String,
    pub instructions: String,
    pub extracted: String,
    /// Raw validation output
    pub valid: String,
    #[serde(skip)]
    pub verdict: Verdict,
    pub resolved: String,
}

impl FieldResult {
    /// Whether the resolution model produced `resolved`
    #[must_use]
    pub fn was_resolved(&self) -> bool {
        self.verdict.needs_resolution()
    }
}

/// One field's cascade over a normalized request
pub struct FieldPipeline<'a> {
    models: &'a ModelSet,
    request: &'a NormalizedRequest,
    field: &'a FieldSpec,
    request_label: &'a str,
    run_id: Uuid,
}

impl<'a> FieldPipeline<'a> {
    pub fn new(
        models: &'a ModelSet,
        request: &'a NormalizedRequest,
        field: &'a FieldSpec,
        request_label: &'a str,
        run_id: Uuid,
    ) -> Self {
        Self {
            models,
            request,
            field,
            request_label,
            run_id,
        }
    }

    /// Run the cascade to completion.
    ///
    /// # Errors
    ///
    /// Any provider failure fails the field; there are no retries.
    pub async fn run(self) -> Result<FieldResult, XtractError> {
        let extracted = self.extract(ModelRole::Extract).await?;

        let valid = self.validate(&extracted).await?;
        let verdict = Verdict::parse(&valid);
        if let Verdict::Unrecognized(raw) = &verdict {
            log_unrecognized_verdict(self.request_label, self.field.name, raw);
        }

        let resolved = if verdict.needs_resolution() {
            self.extract(ModelRole::Resolve).await?
        } else {
            extracted.clone()
        };

        debug!(
            run_id = %self.run_id,
            request_id = %self.request_label,
            field = self.field.name,
            verdict = ?verdict,
            "Field resolved"
        );

        Ok(FieldResult {
            field: self.field.name.to_string(),
            instructions: self.field.instructions.to_string(),
            extracted,
            valid,
            verdict,
            resolved,
        })
    }

    async fn extract(&self, role: ModelRole) -> Result<String, XtractError> {
        let prompt = PromptKind::Extract.template().render(&[
            ("instructions", self.field.instructions),
            ("transcript", self.request.transcript.as_str()),
            ("language", self.request.language.as_str()),
        ])?;
        self.call(role, prompt).await
    }

    async fn validate(&self, extracted: &str) -> Result<String, XtractError> {
        let prompt = PromptKind::Validate.template().render(&[
            ("language", self.request.language.as_str()),
            ("extracted", extracted),
            ("instructions", self.field.instructions),
            ("transcript", self.request.transcript.as_str()),
        ])?;
        self.call(ModelRole::Validate, prompt).await
    }

    async fn call(&self, role: ModelRole, prompt: String) -> Result<String, XtractError> {
        let scope = InvocationScope {
            run_id: self.run_id,
            request_id: self.request_label,
            field: self.field.name,
        };
        Ok(self.models.invoke(role, scope, prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::llm::{LlmError, ScriptedBackend};
    use crate::models::RoleModel;
    use serde_json::json;
    use std::sync::Arc;

    struct Harness {
        extract: Arc<ScriptedBackend>,
        validate: Arc<ScriptedBackend>,
        resolve: Arc<ScriptedBackend>,
        models: ModelSet,
    }

    fn harness(extract: ScriptedBackend, validate: ScriptedBackend, resolve: ScriptedBackend) -> Harness {
        let config = LlmConfig::default();
        let extract = Arc::new(extract);
        let validate = Arc::new(validate);
        let resolve = Arc::new(resolve);
        let models = ModelSet {
            extract: RoleModel::new(extract.clone(), config.extract.clone()),
            validate: RoleModel::new(validate.clone(), config.validate.clone()),
            resolve: RoleModel::new(resolve.clone(), config.resolve.clone()),
            timeout: config.timeout(),
        };
        Harness {
            extract,
            validate,
            resolve,
            models,
        }
    }

    fn request() -> NormalizedRequest {
        crate::request::normalize(&json!({
            "request_id": 1234,
            "in": {
                "transcript": [
                    {"speaker": "Doctor", "message": "What brings you in?"},
                    {"speaker": "Patient", "message": "A headache for three days."}
                ],
                "language": "english"
            },
            "out": "soap_en"
        }))
        .unwrap()
    }

    const FIELD: FieldSpec = FieldSpec {
        name: "complain",
        instructions: "Patient complains.",
    };

    #[test]
    fn test_verdict_parse_is_exact() {
        assert_eq!(Verdict::parse("true"), Verdict::Valid);
        assert_eq!(Verdict::parse("false"), Verdict::Invalid);
        assert_eq!(Verdict::parse("True"), Verdict::Unrecognized("True".to_string()));
        assert_eq!(Verdict::parse("true\n"), Verdict::Unrecognized("true\n".to_string()));
        assert_eq!(Verdict::parse(""), Verdict::Unrecognized(String::new()));
        assert!(!Verdict::Valid.needs_resolution());
        assert!(Verdict::Invalid.needs_resolution());
        assert!(Verdict::Unrecognized("maybe".into()).needs_resolution());
    }

    #[tokio::test]
    async fn test_valid_verdict_passes_extraction_through() {
        let h = harness(
            ScriptedBackend::new().always("Headache for three days."),
            ScriptedBackend::new().always("true"),
            ScriptedBackend::new().always("should not be used"),
        );
        let req = request();

        let result = FieldPipeline::new(&h.models, &req, &FIELD, "1234", Uuid::new_v4())
            .run()
            .await
            .unwrap();

        assert_eq!(result.extracted, "Headache for three days.");
        assert_eq!(result.resolved, result.extracted);
        assert_eq!(result.verdict, Verdict::Valid);
        assert!(!result.was_resolved());
        assert_eq!(h.extract.call_count(), 1);
        assert_eq!(h.validate.call_count(), 1);
        assert_eq!(h.resolve.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_verdict_re_extracts_once_with_resolve_model() {
        let h = harness(
            ScriptedBackend::new().always("Fever."),
            ScriptedBackend::new().always("false"),
            ScriptedBackend::new().always("Headache for three days."),
        );
        let req = request();

        let result = FieldPipeline::new(&h.models, &req, &FIELD, "1234", Uuid::new_v4())
            .run()
            .await
            .unwrap();

        assert_eq!(result.extracted, "Fever.");
        assert_eq!(result.valid, "false");
        assert_eq!(result.resolved, "Headache for three days.");
        assert_eq!(h.resolve.call_count(), 1);
        assert_eq!(h.validate.call_count(), 1);

        let resolve_inv = &h.resolve.invocations()[0];
        assert_eq!(resolve_inv.model, "gpt-4o");
        assert_eq!(resolve_inv.metadata["max_tokens"], json!(300));
        assert_eq!(resolve_inv.tags, vec!["resolve_llm".to_string()]);
        // Resolution reuses the extraction prompt verbatim
        assert_eq!(resolve_inv.prompt(), h.extract.invocations()[0].prompt());
    }

    #[tokio::test]
    async fn test_unrecognized_verdict_routes_to_resolution() {
        let h = harness(
            ScriptedBackend::new().always("Fever."),
            ScriptedBackend::new().always("Yes"),
            ScriptedBackend::new().always("Headache."),
        );
        let req = request();

        let result = FieldPipeline::new(&h.models, &req, &FIELD, "1234", Uuid::new_v4())
            .run()
            .await
            .unwrap();

        assert_eq!(result.verdict, Verdict::Unrecognized("Yes".to_string()));
        assert_eq!(result.resolved, "Headache.");
        assert_eq!(h.resolve.call_count(), 1);
    }

    #[tokio::test]
    async fn test_prompts_carry_transcript_and_extraction() {
        let h = harness(
            ScriptedBackend::new().always("NA"),
            ScriptedBackend::new().always("true"),
            ScriptedBackend::new(),
        );
        let req = request();

        let result = FieldPipeline::new(&h.models, &req, &FIELD, "1234", Uuid::new_v4())
            .run()
            .await
            .unwrap();
        assert_eq!(result.resolved, "NA");

        let extract_prompt = h.extract.invocations()[0].prompt().unwrap().to_string();
        assert!(extract_prompt.contains("you need to extract Patient complains.\n"));
        assert!(extract_prompt.contains(&req.transcript));
        assert!(extract_prompt.contains("Return results in english language."));

        let validate_prompt = h.validate.invocations()[0].prompt().unwrap().to_string();
        assert!(validate_prompt.contains("<extracted_information>\nNA\n</extracted_information>"));
        assert!(validate_prompt.contains(&req.transcript));
    }

    #[tokio::test]
    async fn test_provider_error_fails_field_without_retry() {
        let h = harness(
            ScriptedBackend::new().fail_for("complain", LlmError::ProviderOutage("503".into())),
            ScriptedBackend::new().always("true"),
            ScriptedBackend::new(),
        );
        let req = request();

        let err = FieldPipeline::new(&h.models, &req, &FIELD, "1234", Uuid::new_v4())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, XtractError::Llm(LlmError::ProviderOutage(_))));
        assert_eq!(h.extract.call_count(), 1);
        assert_eq!(h.validate.call_count(), 0);
    }

    #[tokio::test]
    async fn test_every_call_carries_run_id() {
        let h = harness(
            ScriptedBackend::new().always("Fever."),
            ScriptedBackend::new().always("false"),
            ScriptedBackend::new().always("Headache."),
        );
        let req = request();
        let run_id = Uuid::new_v4();

        FieldPipeline::new(&h.models, &req, &FIELD, "1234", run_id)
            .run()
            .await
            .unwrap();

        let calls = [
            h.extract.invocations(),
            h.validate.invocations(),
            h.resolve.invocations(),
        ]
        .concat();
        assert_eq!(calls.len(), 3);
        for inv in &calls {
            assert_eq!(inv.parent_run_id, Some(run_id));
            assert_eq!(inv.request_id, "1234");
        }
    }
}
