//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, dispatches to the command handlers and owns ALL
//! error output. Configuration is discovered only for commands that read it. `main.rs` only maps the returned
//! [`ExitCode`] to the process exit status.

use anyhow::Result;
use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::logging::init_tracing;
use crate::{CliArgs, Config, ExitCode, XtractError};

/// Main CLI execution function.
///
/// Returns `Ok(())` after printing any output, or the exit code to terminate
/// with after printing a user-facing error report to stderr.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.verbose, cli.log_format) {
        eprintln!("Warning: failed to initialize logging: {err}");
    }

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        bind: match &cli.command {
            Commands::Serve { bind } => bind.clone(),
            _ => None,
        },
        timeout_secs: cli.timeout_secs,
        extract_model: cli.extract_model.clone(),
        validate_model: cli.validate_model.clone(),
        resolve_model: cli.resolve_model.clone(),
    };

    let operation = cli.command.name();
    tracing::debug!(operation, "Dispatching command");

    let result = match cli.command {
        Commands::Templates { json } => commands::execute_templates_command(json),
        Commands::Config { json } => {
            let config = discover_config(&cli_args)?;
            commands::execute_config_command(&config, json)
        }
        Commands::Extract { input, pretty } => {
            let config = discover_config(&cli_args)?;
            with_runtime(|rt| {
                rt.block_on(commands::execute_extract_command(&input, pretty, &config))
            })
        }
        Commands::Serve { .. } => {
            let config = discover_config(&cli_args)?;
            with_runtime(|rt| rt.block_on(commands::execute_serve_command(&config)))
        }
    };

    if let Err(error) = result {
        return Err(report_error(&error, operation));
    }

    Ok(())
}

/// Discover configuration, printing the report on failure
fn discover_config(cli_args: &CliArgs) -> Result<Config, ExitCode> {
    Config::discover(cli_args).map_err(|err| {
        let err = XtractError::Config(err);
        eprintln!("{}", err.display_for_user());
        err.to_exit_code()
    })
}

fn with_runtime(f: impl FnOnce(&tokio::runtime::Runtime) -> Result<()>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to create async runtime: {e}"))?;
    f(&rt)
}

/// Print the error report and pick the exit code
fn report_error(error: &anyhow::Error, operation: &str) -> ExitCode {
    if let Some(xtract_error) = error.downcast_ref::<XtractError>() {
        eprintln!("{}", xtract_error.display_for_user());
        return xtract_error.to_exit_code();
    }

    let redacted = xtract_utils::redaction::redact_error_message(&format!("{error:#}"));
    eprintln!("✗ {operation} failed: {redacted}");
    eprintln!("\n  Run with --verbose for more detailed output");
    ExitCode::INTERNAL
}
