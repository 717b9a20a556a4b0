//! # Tracing and Structured Logging
//!
//! Initializes the logging system with environment-appropriate output:
//! pretty, colorized logs for development, JSON for production log
//! aggregation.
//!
//! ## Filter Configuration
//!
//! Verbosity is controlled via `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info,sso_service=debug
//! ```
//!
//! When unset, production defaults to `info` and development to
//! `debug,hyper=info,sqlx=warn`.
//!
//! ## What not to log
//!
//! Passwords, client secrets, tokens, and PKCE verifiers never appear in
//! log fields. Log identifiers (user id, client id, realm slug, session id)
//! instead.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initializes the tracing/logging system.
///
/// Call **once** at the very start of the application, before any code that
/// might emit logs.
///
/// ## Parameters
///
/// - `service_name`: identifies the service in aggregated logs
/// - `is_production`: JSON output when true, pretty output when false
pub fn init_tracing(service_name: &str, is_production: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("debug,hyper=info,sqlx=warn")
        }
    });

    if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
    }

    tracing::info!(
        service = service_name,
        production = is_production,
        "Tracing initialized"
    );
}
