pub mod elevenlabs;
pub mod whisper;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::VoiceProvider;
use crate::error::{VoiceError, VoiceResult};
use crate::transcription::{AudioInput, ConnectionStatus, TranscriptionResult};

/// Trait for voice recognition providers
#[async_trait]
pub trait VoiceProviderTrait: Send + Sync {
    /// Provider name used in logs and transcription metadata
    fn name(&self) -> &'static str;

    /// Transcribe an audio clip to text
    async fn transcribe(&self, audio: AudioInput) -> VoiceResult<TranscriptionResult>;

    /// Verify credentials against the provider without transcribing anything
    async fn check_connection(&self) -> VoiceResult<ConnectionStatus>;
}

/// Create a provider instance based on configuration
pub fn create_provider(config: &VoiceProvider) -> VoiceResult<Arc<dyn VoiceProviderTrait>> {
    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| VoiceError::Config(format!("Failed to build HTTP client: {}", e)))?;

    match config {
        VoiceProvider::ElevenLabs { .. } => {
            Ok(Arc::new(elevenlabs::ElevenLabsProvider::new(config, client)?))
        }
        VoiceProvider::Whisper { .. } => {
            Ok(Arc::new(whisper::WhisperProvider::new(config, client)?))
        }
    }
}

/// Turn a non-success response into a provider error carrying the body
pub(crate) async fn error_for_status(
    provider: &str,
    response: reqwest::Response,
) -> VoiceResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        Err(VoiceError::Authentication(format!(
            "{} rejected credentials ({}): {}",
            provider, status, body
        )))
    } else {
        Err(VoiceError::Provider(format!(
            "{} returned {}: {}",
            provider, status, body
        )))
    }
}

/// Build the multipart file part shared by both providers
pub(crate) fn audio_part(audio: AudioInput) -> VoiceResult<reqwest::multipart::Part> {
    let part = reqwest::multipart::Part::bytes(audio.data).file_name(audio.file_name);
    match audio.content_type {
        Some(mime) => part
            .mime_str(&mime)
            .map_err(|e| VoiceError::Transcription(format!("Invalid audio content type: {}", e))),
        None => Ok(part),
    }
}
