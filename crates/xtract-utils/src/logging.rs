//! Logging and observability setup for xtract
//!
//! Structured logging through `tracing`. Binaries call [`init_tracing`] once;
//! library crates only emit events. Records go to stderr so stdout stays free
//! for command output.

use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_error_message;

/// Output format for log records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line records
    #[default]
    Compact,
    /// One JSON object per record
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "Unknown log format '{other}'. Available formats: compact, json"
            )),
        }
    }
}

/// Build the env filter used by [`init_tracing`].
///
/// `RUST_LOG` wins when set; otherwise verbose mode enables debug output for
/// xtract crates.
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("xtract=debug,info")
            } else {
                EnvFilter::try_new("xtract=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(
    verbose: bool,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = env_filter(verbose);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .json()
                        .with_current_span(true)
                        .with_target(true),
                )
                .try_init()?;
        }
        LogFormat::Compact if verbose => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_line_number(false)
                        .with_file(false)
                        .with_span_events(FmtSpan::CLOSE)
                        .compact(),
                )
                .try_init()?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_line_number(false)
                        .with_file(false)
                        .compact(),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Log the start of an extraction request
pub fn log_request_start(run_id: &str, request_id: &str, template: &str, field_count: usize) {
    info!(
        run_id = %run_id,
        request_id = %request_id,
        template = %template,
        field_count = field_count,
        "Starting extraction request"
    );
}

/// Log a completed extraction request
pub fn log_request_complete(
    run_id: &str,
    request_id: &str,
    template: &str,
    resolved_count: usize,
    elapsed: Duration,
) {
    info!(
        run_id = %run_id,
        request_id = %request_id,
        template = %template,
        resolved_count = resolved_count,
        duration_ms = elapsed.as_millis() as u64,
        "Extraction request completed"
    );
}

/// Log a failed extraction request
///
/// The error text is redacted before it reaches the subscriber.
pub fn log_request_error(
    run_id: &str,
    request_id: &str,
    template: &str,
    error: &str,
    elapsed: Duration,
) {
    error!(
        run_id = %run_id,
        request_id = %request_id,
        template = %template,
        duration_ms = elapsed.as_millis() as u64,
        error = %redact_error_message(error),
        "Extraction request failed"
    );
}

/// Log a validation verdict that was neither `true` nor `false`
pub fn log_unrecognized_verdict(request_id: &str, field: &str, raw: &str) {
    warn!(
        request_id = %request_id,
        field = %field,
        raw_verdict = %raw,
        "Validation returned an unrecognized verdict; routing to resolution"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` with a JSON subscriber installed and return the emitted lines
    fn capture_json(f: impl FnOnce()) -> Vec<String> {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_writer(captured.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.lines()
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_helpers_do_not_panic_without_subscriber() {
        let run_id = "6f1c0a52-3d4e-4b8a-9c1d-2e7f5a9b0c11";
        log_request_start(run_id, "1234", "soap_en", 2);
        log_request_complete(run_id, "1234", "soap_en", 2, Duration::from_millis(5));
        log_request_error(run_id, "1234", "soap_en", "boom", Duration::from_millis(5));
        log_unrecognized_verdict("1234", "complain", "maybe");
    }

    #[test]
    fn test_unrecognized_verdict_record_names_request() {
        let lines = capture_json(|| log_unrecognized_verdict("visit-7", "complain", "maybe"));

        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(r#""level":"WARN""#));
        assert!(lines[0].contains(r#""request_id":"visit-7""#));
        assert!(lines[0].contains(r#""field":"complain""#));
        assert!(lines[0].contains(r#""raw_verdict":"maybe""#));
    }

    #[test]
    fn test_request_records_carry_run_id() {
        let run_id = "6f1c0a52-3d4e-4b8a-9c1d-2e7f5a9b0c11";
        let lines = capture_json(|| {
            log_request_start(run_id, "1234", "soap_en", 2);
            log_request_error(
                run_id,
                "1234",
                "soap_en",
                "auth failed for sk-1234567890abcdefghijklmnopqrstuvwxyz",
                Duration::from_millis(5),
            );
        });

        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert!(line.contains(&format!(r#""run_id":"{run_id}""#)));
            assert!(line.contains(r#""request_id":"1234""#));
        }
        assert!(lines[1].contains("[REDACTED_KEY]"));
        assert!(!lines[1].contains("abcdefghijklmnopqrstuvwxyz"));
    }
}
