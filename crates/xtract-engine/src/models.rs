//! The three model roles of the extraction cascade

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::config::{LlmConfig, ModelProfile};
use crate::llm::{LlmBackend, LlmError, LlmInvocation, Message};

/// Where an invocation comes from, carried into its log records
#[derive(Debug, Clone, Copy)]
pub struct InvocationScope<'a> {
    /// Extraction run the invocation belongs to
    pub run_id: Uuid,
    pub request_id: &'a str,
    pub field: &'a str,
}

/// Which step of the cascade an invocation serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRole {
    Extract,
    Validate,
    Resolve,
}

impl ModelRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Validate => "validate",
            Self::Resolve => "resolve",
        }
    }

    /// Tag attached to every invocation log record for this role
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Extract => "extract_llm",
            Self::Validate => "validate_llm",
            Self::Resolve => "resolve_llm",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend bound to a model profile
#[derive(Clone)]
pub struct RoleModel {
    pub backend: Arc<dyn LlmBackend>,
    pub profile: ModelProfile,
}

impl RoleModel {
    pub fn new(backend: Arc<dyn LlmBackend>, profile: ModelProfile) -> Self {
        Self { backend, profile }
    }
}

impl fmt::Debug for RoleModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleModel")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

/// The extract, validate and resolve models plus the per-invocation timeout
#[derive(Debug, Clone)]
pub struct ModelSet {
    pub extract: RoleModel,
    pub validate: RoleModel,
    pub resolve: RoleModel,
    pub timeout: Duration,
}

impl ModelSet {
    /// Bind one shared backend to the three configured profiles
    pub fn from_config(config: &LlmConfig, backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            extract: RoleModel::new(Arc::clone(&backend), config.extract.clone()),
            validate: RoleModel::new(Arc::clone(&backend), config.validate.clone()),
            resolve: RoleModel::new(backend, config.resolve.clone()),
            timeout: config.timeout(),
        }
    }

    #[must_use]
    pub fn role(&self, role: ModelRole) -> &RoleModel {
        match role {
            ModelRole::Extract => &self.extract,
            ModelRole::Validate => &self.validate,
            ModelRole::Resolve => &self.resolve,
        }
    }

    /// Send `prompt` as a single user message to the model serving `role`.
    ///
    /// Returns the model's text verbatim.
    ///
    /// # Errors
    ///
    /// Propagates the backend's `LlmError` unchanged.
    pub async fn invoke(
        &self,
        role: ModelRole,
        scope: InvocationScope<'_>,
        prompt: String,
    ) -> Result<String, LlmError> {
        let model = self.role(role);
        let invocation = LlmInvocation::new(
            scope.request_id,
            scope.field,
            model.profile.model.clone(),
            self.timeout,
            vec![Message::user(prompt)],
        )
        .with_max_tokens(model.profile.max_tokens)
        .with_temperature(model.profile.temperature())
        .with_tag(role.tag())
        .with_parent_run_id(scope.run_id);

        let result = model.backend.invoke(invocation).await?;
        Ok(result.raw_response)
    }
}
