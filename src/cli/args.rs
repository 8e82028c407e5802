//! CLI argument definitions and parsing structures

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// xtract - structured field extraction from dialogue transcripts
#[derive(Parser, Debug)]
#[command(name = "xtract")]
#[command(about = "Extract structured fields from dialogue transcripts with an LLM cascade")]
#[command(long_about = r#"
xtract turns a dialogue transcript into a flat record of named fields. Every field
runs through an extract → validate → resolve cascade of chat-completion calls, and
all fields of a template run concurrently.

EXAMPLES:
  # Serve the HTTP API on the default address (127.0.0.1:8000)
  xtract serve

  # Extract from a request file
  xtract extract --input request.json --pretty

  # Extract from stdin
  cat request.json | xtract extract

  # List registered templates and their fields
  xtract templates

  # Show the effective configuration and where each value came from
  xtract config

REQUEST SHAPE:
  {"request_id": 1234,
   "in": {"transcript": [{"speaker": "Doctor", "message": "..."}], "language": "english"},
   "out": "soap_en"}

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file: --config, else $XTRACT_HOME/config.toml, else .xtract/config.toml
  found by searching upward from CWD. The provider API key is read from the
  environment variable named by llm.api_key_env (OPENAI_API_KEY by default).
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format: compact or json
    #[arg(long, global = true, default_value = "compact")]
    pub log_format: LogFormat,

    /// Per-invocation provider timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Model used for extraction
    #[arg(long, global = true)]
    pub extract_model: Option<String>,

    /// Model used for validation
    #[arg(long, global = true)]
    pub validate_model: Option<String>,

    /// Model used for resolution
    #[arg(long, global = true)]
    pub resolve_model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Socket address to bind, e.g. 0.0.0.0:8000
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run one extraction request and print the response
    Extract {
        /// Request file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Pretty-print the response
        #[arg(long)]
        pretty: bool,
    },

    /// List registered templates
    Templates {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Operation name used in error reports
    pub fn name(&self) -> &'static str {
        match self {
            Self::Serve { .. } => "serve",
            Self::Extract { .. } => "extract",
            Self::Templates { .. } => "templates",
            Self::Config { .. } => "config",
        }
    }
}

/// Build the clap command (used for completion and doc generation)
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
