//! CLI tests module
//!
//! Argument parsing and command helpers.

use super::*;
use clap::Parser;
use std::io::Write;
use tempfile::NamedTempFile;

use crate::logging::LogFormat;

#[test]
fn test_cli_definition_is_consistent() {
    build_cli().debug_assert();
}

#[test]
fn test_parse_extract_defaults_to_stdin() {
    let cli = Cli::try_parse_from(["xtract", "extract"]).unwrap();
    match cli.command {
        Commands::Extract { input, pretty } => {
            assert_eq!(input, "-");
            assert!(!pretty);
        }
        other => panic!("expected extract, got {other:?}"),
    }
    assert_eq!(cli.log_format, LogFormat::Compact);
    assert!(!cli.verbose);
}

#[test]
fn test_parse_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "xtract",
        "serve",
        "--bind",
        "0.0.0.0:9000",
        "--timeout-secs",
        "30",
        "--log-format",
        "json",
        "--resolve-model",
        "gpt-4o-2024-08-06",
        "-v",
    ])
    .unwrap();

    match &cli.command {
        Commands::Serve { bind } => assert_eq!(bind.as_deref(), Some("0.0.0.0:9000")),
        other => panic!("expected serve, got {other:?}"),
    }
    assert_eq!(cli.timeout_secs, Some(30));
    assert_eq!(cli.log_format, LogFormat::Json);
    assert_eq!(cli.resolve_model.as_deref(), Some("gpt-4o-2024-08-06"));
    assert!(cli.verbose);
    assert_eq!(cli.command.name(), "serve");
}

#[test]
fn test_rejects_unknown_log_format() {
    assert!(Cli::try_parse_from(["xtract", "--log-format", "xml", "templates"]).is_err());
}

#[test]
fn test_rejects_missing_subcommand() {
    assert!(Cli::try_parse_from(["xtract"]).is_err());
}

#[test]
fn test_read_input_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"request_id": 1}}"#).unwrap();

    let text = commands::read_input(file.path().to_str().unwrap()).unwrap();
    assert_eq!(text, r#"{"request_id": 1}"#);
}

#[test]
fn test_read_input_missing_file() {
    let err = commands::read_input("/nonexistent/xtract/request.json").unwrap_err();
    assert!(err.to_string().contains("Failed to read request file"));
}
