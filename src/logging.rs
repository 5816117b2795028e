//! # Structured Logging Module
//!
//! Environment-aware structured logging for batch runs, plus the helpers that
//! emit the batch's reporting surface: per-round failure counts and the total
//! runtime.

use chrono::Utc;
use std::io::IsTerminal;
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::loader::detect_environment;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Set to any value to add a JSON layer on stderr
pub const JSON_LOG_VAR: &str = "CLIP_BATCH_LOG_JSON";

/// Initialize structured logging with environment-specific configuration
///
/// `RUST_LOG` takes precedence over the environment's default level. Logs go to
/// stderr; stdout is reserved for reports.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = detect_environment();
        let log_level = get_log_level(&environment);
        let json = std::env::var_os(JSON_LOG_VAR).is_some();

        let filter = || {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
        };

        let ansi = std::io::stderr().is_terminal();

        let console = (!json).then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(ansi)
                .with_filter(filter())
        });

        let json_layer = json.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter())
        });

        // A global subscriber may already exist (tests, embedding applications)
        if tracing_subscriber::registry()
            .with(console)
            .with(json_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log the outcome of one round
pub fn log_round_operation(
    operation: &str,
    target: &str,
    job_count: usize,
    failed: Option<usize>,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        target_dataset = %target,
        job_count = job_count,
        failed = failed,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "ROUND_OPERATION"
    );
}

/// Log the total runtime of a batch
pub fn log_batch_runtime(batch_id: &str, elapsed: Duration, rounds: usize, failed_rounds: usize) {
    tracing::info!(
        batch_id = %batch_id,
        rounds = rounds,
        failed_rounds = failed_rounds,
        elapsed_seconds = elapsed.as_secs_f64(),
        timestamp = %Utc::now().to_rfc3339(),
        "Batch runtime: {:.3} seconds",
        elapsed.as_secs_f64()
    );
}

/// Log error with full context
pub fn log_batch_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "BATCH_ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
        log_round_operation("dispatch", "Roads", 3, Some(0), None);
        log_batch_runtime("test-batch", Duration::from_millis(1500), 2, 0);
    }
}
