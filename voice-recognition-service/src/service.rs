use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::VoiceConfig;
use crate::error::{VoiceError, VoiceResult};
use crate::providers::{create_provider, VoiceProviderTrait};
use crate::transcription::{AudioInput, ConnectionStatus, TranscriptionResult};

/// Speech-to-text front door used by the request pipeline.
///
/// Created once at process start and shared across requests; the provider
/// holds a pooled HTTP client.
#[derive(Clone)]
pub struct VoiceService {
    provider: Arc<dyn VoiceProviderTrait>,
    timeout: Duration,
}

impl VoiceService {
    /// Create a new voice recognition service
    pub fn new(config: VoiceConfig) -> VoiceResult<Self> {
        let provider = create_provider(&config.provider)?;
        info!(provider = provider.name(), timeout_secs = config.timeout.as_secs(), "Voice recognition service ready");
        Ok(Self::with_provider(provider, config.timeout))
    }

    /// Wrap an already constructed provider
    pub fn with_provider(provider: Arc<dyn VoiceProviderTrait>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Transcribe an audio clip, bounded by the configured deadline and the
    /// caller's cancellation token.
    pub async fn transcribe(
        &self,
        audio: AudioInput,
        cancel: &CancellationToken,
    ) -> VoiceResult<TranscriptionResult> {
        if audio.is_empty() {
            return Err(VoiceError::Transcription("Audio upload is empty".to_string()));
        }

        debug!(audio_size = audio.len(), provider = self.provider.name(), "Transcribing audio");

        tokio::select! {
            _ = cancel.cancelled() => {
                warn!(provider = self.provider.name(), "Transcription cancelled");
                Err(VoiceError::Cancelled)
            }
            outcome = tokio::time::timeout(self.timeout, self.provider.transcribe(audio)) => {
                match outcome {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(provider = self.provider.name(), timeout_secs = self.timeout.as_secs(), "Transcription timed out");
                        Err(VoiceError::Timeout(self.timeout))
                    }
                }
            }
        }
    }

    /// Check provider credentials
    pub async fn check_connection(&self) -> VoiceResult<ConnectionStatus> {
        match tokio::time::timeout(self.timeout, self.provider.check_connection()).await {
            Ok(status) => status,
            Err(_) => Err(VoiceError::Timeout(self.timeout)),
        }
    }
}
