//! The xtract extraction cascade
//!
//! A request flows through [`request::normalize`], a template lookup, one
//! [`field::FieldPipeline`] per template field (extract → validate → conditional
//! resolve) run concurrently by [`template::run_template`], and is folded into an
//! [`response::ExtractionResponse`]. [`orchestrator::Orchestrator`] ties the stages
//! together.

// Re-export shared crates so engine modules use `crate::` paths.
pub use xtract_config as config;
pub use xtract_llm as llm;
pub use xtract_prompt_template as prompt;
pub use xtract_templates as templates;

pub use xtract_utils::error;
pub use xtract_utils::logging;

pub mod field;
pub mod models;
pub mod orchestrator;
pub mod request;
pub mod response;
pub mod template;

pub use field::{FieldPipeline, FieldResult, Verdict};
pub use models::{InvocationScope, ModelRole, ModelSet, RoleModel};
pub use orchestrator::Orchestrator;
pub use request::{NormalizedRequest, Turn, normalize};
pub use response::ExtractionResponse;
