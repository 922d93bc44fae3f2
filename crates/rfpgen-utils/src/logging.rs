//! Logging and observability infrastructure for rfpgen
//!
//! Structured logging through `tracing`. The CLI installs the subscriber once
//! with [`init_tracing`]; library code only emits events and spans.

use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_secrets;
use crate::types::{GenerationMode, RequirementId};

/// Initialize tracing subscriber for structured logging
///
/// Sets up tracing with either compact (default) or verbose format.
/// `RUST_LOG` takes precedence over both defaults. Verbose output adds
/// span-close events so each generation reports its duration.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("rfpgen=debug,info")
            } else {
                EnvFilter::try_new("rfpgen=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span covering one generation request.
pub fn generation_span(requirement_id: RequirementId, mode: GenerationMode) -> tracing::Span {
    span!(
        Level::INFO,
        "generation",
        requirement_id = %requirement_id,
        mode = %mode,
    )
}

/// Log entry into a generation phase
pub fn log_phase_start(requirement_id: RequirementId, phase: &str) {
    info!(
        requirement_id = %requirement_id,
        phase = %phase,
        "Entering generation phase"
    );
}

/// Log phase completion with duration
pub fn log_phase_complete(requirement_id: RequirementId, phase: &str, duration_ms: u128) {
    info!(
        requirement_id = %requirement_id,
        phase = %phase,
        duration_ms = %duration_ms,
        "Generation phase completed"
    );
}

/// Log phase error with context
///
/// Error messages are redacted to prevent secrets from appearing in logs.
pub fn log_phase_error(requirement_id: RequirementId, phase: &str, err: &str, duration_ms: u128) {
    let sanitized = redact_secrets(err);
    error!(
        requirement_id = %requirement_id,
        phase = %phase,
        duration_ms = %duration_ms,
        error = %sanitized,
        "Generation phase failed"
    );
}
