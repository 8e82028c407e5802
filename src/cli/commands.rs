//! CLI command implementations
//!
//! Each `execute_*` function handles one subcommand. Library errors are returned
//! as `XtractError` inside `anyhow::Error` so `run()` can map them to exit codes.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Read;
use std::net::SocketAddr;
use std::path::Path;

use crate::engine::{Orchestrator, normalize};
use crate::error::ConfigError;
use crate::server;
use crate::{Config, TemplateRegistry, XtractError};

// ============================================================================
// Templates Command
// ============================================================================

/// List registered templates and their fields
pub fn execute_templates_command(json: bool) -> Result<()> {
    let registry = TemplateRegistry::builtin();

    if json {
        let templates: Vec<_> = registry.iter().collect();
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    for template in registry.iter() {
        println!("{}", template.name);
        for field in &template.fields {
            println!("  {}", field.name);
        }
    }
    Ok(())
}

// ============================================================================
// Config Command
// ============================================================================

#[derive(Serialize)]
struct ConfigRow {
    key: String,
    value: String,
    source: crate::ConfigSource,
}

/// Print the effective configuration with the source of every value
pub fn execute_config_command(config: &Config, json: bool) -> Result<()> {
    let rows: Vec<ConfigRow> = config
        .effective_settings()
        .into_iter()
        .map(|(key, value, source)| ConfigRow { key, value, source })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let width = rows.iter().map(|row| row.key.len()).max().unwrap_or(0);
    println!("Effective configuration:");
    for row in &rows {
        println!("  {:<width$} = {} ({})", row.key, row.value, row.source);
    }
    Ok(())
}

// ============================================================================
// Extract Command
// ============================================================================

/// Run one request from a file or stdin and print the flat response
pub async fn execute_extract_command(input: &str, pretty: bool, config: &Config) -> Result<()> {
    let text = read_input(input)?;

    let body: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| XtractError::MalformedInput(format!("request is not valid JSON: {e}")))?;

    // Reject bad requests before the backend needs an API key
    let request = normalize(&body)?;
    TemplateRegistry::builtin().get(&request.template)?;

    let orchestrator = Orchestrator::from_config(&config.llm)?;
    let response = orchestrator.invoke_request(&request).await?;

    let output = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{output}");
    Ok(())
}

pub(crate) fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read request from stdin")?;
        return Ok(text);
    }

    let path = Path::new(input);
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))
}

// ============================================================================
// Serve Command
// ============================================================================

/// Serve the HTTP API on the configured bind address
pub async fn execute_serve_command(config: &Config) -> Result<()> {
    let addr: SocketAddr = config.server.bind.parse().map_err(|e| {
        XtractError::Config(ConfigError::InvalidValue {
            key: "server.bind".to_string(),
            value: format!("'{}' ({e})", config.server.bind),
        })
    })?;

    let orchestrator = Orchestrator::from_config(&config.llm)?;
    server::serve(orchestrator, addr).await
}
