use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audio clip handed to a provider
#[derive(Debug, Clone)]
pub struct AudioInput {
    pub data: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
}

impl AudioInput {
    pub fn new(data: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            data,
            file_name: file_name.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Transcription result from voice recognition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub id: Uuid,
    pub text: String,
    pub language: Option<String>,
    pub language_probability: Option<f32>,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
    pub metadata: TranscriptionMetadata,
}

/// Metadata associated with transcription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionMetadata {
    pub provider: String,
    pub model: Option<String>,
    pub audio_bytes: usize,
}

impl TranscriptionResult {
    pub fn new(text: String, metadata: TranscriptionMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            language: None,
            language_probability: None,
            duration_ms: 0,
            created_at: Utc::now(),
            metadata,
        }
    }
}

/// Outcome of a provider credential check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub provider: String,
    pub status_code: u16,
    pub ok: bool,
    pub body: String,
}
