use error_common::{MedvoxError, Result};
use records_store::BackendConfig;
use records_tools::SelectorConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use voice_recognition_service::VoiceConfig;

/// Default maximum accepted audio upload (25 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Deadlines applied inside one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTimeouts {
    /// Speech-to-text call
    pub transcribe: Duration,
    /// Tool-selection call to the language model
    pub selection: Duration,
    /// Each dispatched tool call
    pub tool_call: Duration,
    /// Whole `/get_data` or `/query` request
    pub request: Duration,
}

impl Default for PipelineTimeouts {
    fn default() -> Self {
        Self {
            transcribe: Duration::from_secs(60),
            selection: Duration::from_secs(30),
            tool_call: Duration::from_secs(10),
            request: Duration::from_secs(120),
        }
    }
}

/// Everything the server needs at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub voice: VoiceConfig,
    pub selector: SelectorConfig,
    pub backend: BackendConfig,
    pub timeouts: PipelineTimeouts,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from a variable lookup.
    ///
    /// Every missing required variable is reported in a single error.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).is_some_and(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let provider = lookup("VOICE_PROVIDER").unwrap_or_else(|| "elevenlabs".to_string());
        let needs_elevenlabs = provider.trim().is_empty() || provider.eq_ignore_ascii_case("elevenlabs");
        if needs_elevenlabs && !present("ELEVENLABS_API_KEY") {
            missing.push("ELEVENLABS_API_KEY");
        }
        if !present("OPENAI_API_KEY") && !present("OPENAI_KEY") {
            missing.push("OPENAI_API_KEY");
        }
        for key in ["SUPABASE_URL", "SUPABASE_KEY"] {
            if !present(key) {
                missing.push(key);
            }
        }
        if !missing.is_empty() {
            return Err(MedvoxError::configuration(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let voice = VoiceConfig::from_vars(&lookup).map_err(|e| MedvoxError::classified(&e))?;
        let selector = SelectorConfig::from_vars(&lookup).map_err(|e| MedvoxError::classified(&e))?;
        let backend = BackendConfig::from_vars(&lookup).map_err(|e| MedvoxError::classified(&e))?;

        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key).filter(|v| !v.trim().is_empty()) {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| {
                        MedvoxError::configuration(format!("{} must be a positive number of seconds, got '{}'", key, raw))
                    }),
            }
        };

        let defaults = PipelineTimeouts::default();
        let timeouts = PipelineTimeouts {
            transcribe: voice.timeout,
            selection: secs("MEDVOX_LLM_TIMEOUT_SECS", defaults.selection)?,
            tool_call: secs("MEDVOX_TOOL_TIMEOUT_SECS", defaults.tool_call)?,
            request: secs("MEDVOX_REQUEST_TIMEOUT_SECS", defaults.request)?,
        };

        let max_upload_bytes = match lookup("MEDVOX_MAX_UPLOAD_BYTES").filter(|v| !v.trim().is_empty()) {
            None => DEFAULT_MAX_UPLOAD_BYTES,
            Some(raw) => raw.trim().parse().map_err(|_| {
                MedvoxError::configuration(format!("MEDVOX_MAX_UPLOAD_BYTES must be a byte count, got '{}'", raw))
            })?,
        };

        Ok(Self {
            voice,
            selector,
            backend,
            timeouts,
            max_upload_bytes,
        })
    }
}
