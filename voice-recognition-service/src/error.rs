use error_common::{Classify, ErrorKind};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Transcription timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transcription cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Classify for VoiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            VoiceError::Config(_) => ErrorKind::Configuration,
            VoiceError::Timeout(_) => ErrorKind::Timeout,
            VoiceError::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::UpstreamFailure,
        }
    }
}

pub type VoiceResult<T> = Result<T, VoiceError>;
