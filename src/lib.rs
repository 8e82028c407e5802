//! xtract - structured field extraction from dialogue transcripts
//!
//! A request carries a transcript, a target language and a template key. Every
//! field of the template runs through an extract → validate → resolve cascade of
//! chat-completion calls; fields run concurrently and the resolved values come
//! back as one flat object tagged with the request's `request_id`.
//!
//! xtract can be used in two ways:
//! - **CLI / server**: `xtract serve`, `xtract extract --input request.json`
//! - **Library**: build an [`Orchestrator`] and call [`Orchestrator::invoke`]
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use serde_json::json;
//! use xtract::{Config, CliArgs, Orchestrator};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::discover(&CliArgs::default())?;
//! let orchestrator = Orchestrator::from_config(&config.llm)?;
//! let response = orchestrator
//!     .invoke(&json!({
//!         "request_id": 1234,
//!         "in": {"transcript": [{"speaker": "Doctor", "message": "Hi"}], "language": "english"},
//!         "out": "soap_en"
//!     }))
//!     .await?;
//! assert!(response.get("complain").is_some());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod server;

pub use xtract_engine as engine;
pub use xtract_utils::{error, logging};

/// Configuration with discovery and precedence: CLI arguments > config file > defaults.
pub use xtract_config::{CliArgs, Config};

/// Where an effective configuration value came from.
pub use xtract_utils::types::ConfigSource;

/// Runs extraction requests; see [`engine::orchestrator`].
pub use xtract_engine::{ExtractionResponse, Orchestrator};

/// Read-only template → field instruction table.
pub use xtract_templates::TemplateRegistry;

/// Library error type with user-facing reporting via
/// [`display_for_user()`](XtractError::display_for_user).
pub use xtract_utils::error::XtractError;

/// CLI exit codes.
pub use xtract_utils::exit_codes::ExitCode;
