//! OpenAI-compatible Whisper Provider
//!
//! Works with the hosted OpenAI API as well as self-hosted servers that
//! expose `/v1/audio/transcriptions`.
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

use crate::config::VoiceProvider;
use crate::error::{VoiceError, VoiceResult};
use crate::providers::{audio_part, error_for_status, VoiceProviderTrait};
use crate::transcription::{AudioInput, ConnectionStatus, TranscriptionMetadata, TranscriptionResult};

pub struct WhisperProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

impl WhisperProvider {
    pub fn new(config: &VoiceProvider, client: reqwest::Client) -> VoiceResult<Self> {
        match config {
            VoiceProvider::Whisper { api_url, api_key, model } => Ok(Self {
                client,
                api_url: api_url.trim_end_matches('/').to_string(),
                api_key: api_key.clone(),
                model: model.clone(),
            }),
            other => Err(VoiceError::Config(format!(
                "Whisper provider given {} configuration",
                other.name()
            ))),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl VoiceProviderTrait for WhisperProvider {
    fn name(&self) -> &'static str {
        "whisper"
    }

    async fn transcribe(&self, audio: AudioInput) -> VoiceResult<TranscriptionResult> {
        let started = Instant::now();
        let audio_bytes = audio.len();

        let form = reqwest::multipart::Form::new()
            .part("file", audio_part(audio)?)
            .text("model", self.model.clone());

        let request = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.api_url))
            .multipart(form);
        let response = self.authorize(request).send().await?;
        let response = error_for_status("Whisper", response).await?;
        let whisper: WhisperResponse = response.json().await?;

        let mut result = TranscriptionResult::new(
            whisper.text,
            TranscriptionMetadata {
                provider: self.name().to_string(),
                model: Some(self.model.clone()),
                audio_bytes,
            },
        );
        result.language = whisper.language;
        result.duration_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn check_connection(&self) -> VoiceResult<ConnectionStatus> {
        let request = self.client.get(format!("{}/v1/models", self.api_url));
        let response = self.authorize(request).send().await?;

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
