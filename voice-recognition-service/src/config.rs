use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{VoiceError, VoiceResult};

pub const DEFAULT_ELEVENLABS_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// Provider-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VoiceProvider {
    /// ElevenLabs Scribe speech-to-text
    ElevenLabs {
        api_url: String,
        api_key: String,
        model_id: String,      // e.g., "scribe_v1"
        language_code: String, // ISO 639-3, e.g., "eng"
        diarize: bool,
        tag_audio_events: bool,
    },
    /// OpenAI-compatible Whisper endpoint
    Whisper {
        api_url: String,
        api_key: Option<String>,
        model: String, // e.g., "whisper-1"
    },
}

impl VoiceProvider {
    pub fn name(&self) -> &'static str {
        match self {
            VoiceProvider::ElevenLabs { .. } => "elevenlabs",
            VoiceProvider::Whisper { .. } => "whisper",
        }
    }
}

/// Voice recognition service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VoiceConfig {
    pub provider: VoiceProvider,
    /// Deadline for a single transcription call
    pub timeout: Duration,
}

impl VoiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> VoiceResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as missing.
    pub fn from_vars<F>(lookup: F) -> VoiceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = var("MEDVOX_TRANSCRIBE_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        let provider_type = var("VOICE_PROVIDER").unwrap_or_else(|| "elevenlabs".to_string());

        let provider = match provider_type.to_lowercase().as_str() {
            "elevenlabs" => VoiceProvider::ElevenLabs {
                api_url: var("ELEVENLABS_API_URL")
                    .unwrap_or_else(|| DEFAULT_ELEVENLABS_URL.to_string()),
                api_key: var("ELEVENLABS_API_KEY").ok_or_else(|| {
                    VoiceError::Config("ELEVENLABS_API_KEY not found".to_string())
                })?,
                model_id: var("ELEVENLABS_MODEL_ID").unwrap_or_else(|| "scribe_v1".to_string()),
                language_code: var("ELEVENLABS_LANGUAGE_CODE").unwrap_or_else(|| "eng".to_string()),
                diarize: var("ELEVENLABS_DIARIZE")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
                tag_audio_events: var("ELEVENLABS_TAG_AUDIO_EVENTS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
            "whisper" => VoiceProvider::Whisper {
                api_url: var("WHISPER_API_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
                api_key: var("WHISPER_API_KEY")
                    .or_else(|| var("OPENAI_API_KEY"))
                    .or_else(|| var("OPENAI_KEY")),
                model: var("WHISPER_MODEL").unwrap_or_else(|| "whisper-1".to_string()),
            },
            _ => {
                return Err(VoiceError::Config(format!(
                    "Unknown voice provider: {}",
                    provider_type
                )))
            }
        };

        Ok(Self { provider, timeout })
    }
}
