//! ElevenLabs Scribe Provider
//!
//! Posts the clip as multipart form data to `/v1/speech-to-text` and reads
//! the `text` field of the response. Authentication is the `xi-api-key`
//! header.
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;
use tracing::debug;

use crate::config::VoiceProvider;
use crate::error::{VoiceError, VoiceResult};
use crate::providers::{audio_part, error_for_status, VoiceProviderTrait};
use crate::transcription::{AudioInput, ConnectionStatus, TranscriptionMetadata, TranscriptionResult};

pub struct ElevenLabsProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model_id: String,
    language_code: String,
    diarize: bool,
    tag_audio_events: bool,
}

#[derive(Debug, Deserialize)]
struct ScribeResponse {
    text: String,
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default)]
    language_probability: Option<f32>,
}

impl ElevenLabsProvider {
    pub fn new(config: &VoiceProvider, client: reqwest::Client) -> VoiceResult<Self> {
        match config {
            VoiceProvider::ElevenLabs {
                api_url,
                api_key,
                model_id,
                language_code,
                diarize,
                tag_audio_events,
            } => Ok(Self {
                client,
                api_url: api_url.trim_end_matches('/').to_string(),
                api_key: api_key.clone(),
                model_id: model_id.clone(),
                language_code: language_code.clone(),
                diarize: *diarize,
                tag_audio_events: *tag_audio_events,
            }),
            other => Err(VoiceError::Config(format!(
                "ElevenLabs provider given {} configuration",
                other.name()
            ))),
        }
    }
}

#[async_trait]
impl VoiceProviderTrait for ElevenLabsProvider {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    async fn transcribe(&self, audio: AudioInput) -> VoiceResult<TranscriptionResult> {
        let started = Instant::now();
        let audio_bytes = audio.len();

        let form = reqwest::multipart::Form::new()
            .part("file", audio_part(audio)?)
            .text("model_id", self.model_id.clone())
            .text("language_code", self.language_code.clone())
            .text("diarize", self.diarize.to_string())
            .text("tag_audio_events", self.tag_audio_events.to_string());

        let response = self
            .client
            .post(format!("{}/v1/speech-to-text", self.api_url))
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let response = error_for_status("ElevenLabs", response).await?;
        let scribe: ScribeResponse = response.json().await?;

        debug!(
            audio_bytes = audio_bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ElevenLabs transcription complete"
        );

        let mut result = TranscriptionResult::new(
            scribe.text,
            TranscriptionMetadata {
                provider: self.name().to_string(),
                model: Some(self.model_id.clone()),
                audio_bytes,
            },
        );
        result.language = scribe.language_code;
        result.language_probability = scribe.language_probability;
        result.duration_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn check_connection(&self) -> VoiceResult<ConnectionStatus> {
        let response = self
            .client
            .get(format!("{}/v1/user", self.api_url))
            .header("xi-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok(ConnectionStatus {
            provider: self.name().to_string(),
            status_code: status.as_u16(),
            ok: status.is_success(),
            body,
        })
    }
}
