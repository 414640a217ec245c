//! Logging for the Medvox pipeline
//!
//! Voice transcripts and tool arguments routinely contain protected health
//! information: patient names, dates of birth, free-text clinical notes. The
//! pipeline never logs those strings directly; it passes them through
//! [`PiiRedactor`] first. Upstream error bodies may echo API keys, so those
//! go through the redactor too.
//!
//! # Redacted Data Types
//!
//! - **Dates** (dates of birth, scan dates): 1985-03-02 → DATE[hash]
//! - **Email Addresses**: user@example.com → EMAIL[hash]
//! - **Phone Numbers**: (555) 123-4567 → PHONE[hash]
//! - **Bearer tokens and API keys**: `Bearer abc…`, `sk-…` → [REDACTED]
//! - **JWTs** (Supabase service keys): eyJ… → JWT[REDACTED]
//! - **Custom Patterns**: caller-supplied regexes
//!
//! Hashes are stable, so two log lines mentioning the same value can be
//! correlated without revealing it.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::{PiiRedactor, RedactionConfig};
//!
//! let redactor = PiiRedactor::new(RedactionConfig::default());
//! let line = redactor.redact("DOB for Steven is 1985-03-02");
//! assert!(!line.contains("1985-03-02"));
//! ```

pub mod config;
pub mod redactor;

pub use config::*;
pub use redactor::*;

use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `config.default_directives()`. Calling this twice returns an error
/// instead of panicking.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.ansi)
                    .with_level(true),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init(),
    }
}
