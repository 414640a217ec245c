// Logger configuration
use serde::{Deserialize, Serialize};

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, for local development
    Pretty,
    /// One JSON object per line, for production
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub log_level: String,
    pub ansi: bool,
    /// Crates that get `log_level` in the default filter
    pub crates: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            log_level: "info".to_string(),
            ansi: true,
            crates: vec![
                "medvox_server".to_string(),
                "records_tools".to_string(),
                "records_store".to_string(),
                "voice_recognition_service".to_string(),
            ],
        }
    }
}

impl LoggingConfig {
    /// Build from `MEDVOX_ENV`, `LOG_FORMAT` and `NO_COLOR`.
    ///
    /// Production defaults to JSON output; `LOG_FORMAT` overrides either way.
    pub fn from_env(verbose: bool) -> Self {
        let is_production = std::env::var("MEDVOX_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            _ if is_production => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            format,
            log_level: if verbose { "debug" } else { "info" }.to_string(),
            ansi: std::env::var("NO_COLOR").is_err(),
            ..Self::default()
        }
    }

    /// Add a crate to the default filter (e.g. the binary's own crate)
    pub fn with_crate(mut self, name: impl Into<String>) -> Self {
        self.crates.push(name.into());
        self
    }

    /// Filter used when `RUST_LOG` is not set
    pub fn default_directives(&self) -> String {
        let mut directives: Vec<String> = self
            .crates
            .iter()
            .map(|c| format!("{}={}", c, self.log_level))
            .collect();
        directives.push("tower_http=info".to_string());
        directives.push("hyper=warn".to_string());
        directives.push("reqwest=warn".to_string());
        directives.join(",")
    }
}
