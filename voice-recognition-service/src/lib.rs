//! Voice Recognition Service for the Medvox records pipeline
//!
//! Turns an uploaded audio clip into a transcript that the tool-selection
//! step can work with. Providers are hosted services reached over HTTP:
//!
//! - **ElevenLabs Scribe** - default, diarized English transcription
//! - **Whisper** - any OpenAI-compatible `/v1/audio/transcriptions` endpoint
//!
//! Every call runs under the configured deadline and can be abandoned through
//! a [`tokio_util::sync::CancellationToken`] owned by the calling request.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use voice_recognition_service::{AudioInput, VoiceConfig, VoiceService};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(audio_data: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = VoiceConfig::from_env()?;
//! let voice_service = VoiceService::new(config)?;
//!
//! let transcription = voice_service
//!     .transcribe(AudioInput::new(audio_data, "clip.wav"), &CancellationToken::new())
//!     .await?;
//!
//! println!("Transcription: {}", transcription.text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod providers;
pub mod service;
pub mod transcription;

pub use config::*;
pub use error::*;
pub use service::*;
pub use transcription::*;
