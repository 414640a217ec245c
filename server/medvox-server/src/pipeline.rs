//! Request pipeline: transcript → tool selection → dispatch → rendering
//!
//! Every stage runs under its own deadline and the request's cancellation
//! token. Failures are reported in the response body; the pipeline itself
//! never fails.

use error_common::{Classify, ErrorKind};
use records_tools::{render_outcome, run_with_deadline, DispatchRecord, ResponseFormat, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, warn};
use voice_recognition_service::AudioInput;

use crate::state::AppState;

/// One entry of the `results` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Operation name; null for a plain-text model reply
    pub function: Option<String>,
    pub arguments: Option<Value>,
    /// Rendered result (text or JSON object)
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ResultEntry {
    pub fn render(record: DispatchRecord, format: ResponseFormat) -> Self {
        Self {
            function: Some(record.call.name),
            arguments: Some(record.call.arguments),
            result: render_outcome(format, &record.outcome),
            error_kind: record.outcome.err().map(|f| f.kind),
        }
    }

    fn reply(text: String) -> Self {
        Self {
            function: None,
            arguments: None,
            result: Value::String(text),
            error_kind: None,
        }
    }
}

/// Body returned by `/get_data` and `/query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResponse {
    /// Transcript (or the submitted text); null when transcription failed
    pub transcription: Option<String>,
    pub results: Vec<ResultEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl PipelineResponse {
    fn failed(transcription: Option<String>, kind: ErrorKind, message: String) -> Self {
        Self {
            transcription,
            results: Vec::new(),
            error: Some(message),
            error_kind: Some(kind),
        }
    }
}

/// Cancellation scope of one request.
///
/// The token is cancelled when the whole-request deadline passes or when the
/// scope is dropped, which happens if the client disconnects and axum drops
/// the handler future.
pub struct RequestScope {
    token: CancellationToken,
    _guard: DropGuard,
    timer: JoinHandle<()>,
}

impl RequestScope {
    pub fn new(deadline: Duration) -> Self {
        let token = CancellationToken::new();
        let expiry = token.clone();
        let timer = tokio::spawn(async move {
            tokio::select! {
                _ = expiry.cancelled() => {}
                _ = tokio::time::sleep(deadline) => {
                    warn!(deadline_secs = deadline.as_secs(), "Request deadline reached, cancelling");
                    expiry.cancel();
                }
            }
        });

        Self {
            _guard: token.clone().drop_guard(),
            token,
            timer,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Transcribe an upload, then run the text pipeline on the transcript
pub async fn run_audio(
    state: &AppState,
    audio: AudioInput,
    format: ResponseFormat,
    cancel: &CancellationToken,
) -> PipelineResponse {
    let transcription = match state.voice.transcribe(audio, cancel).await {
        Ok(result) => result.text,
        Err(err) => {
            warn!(error_kind = %err.kind(), "Transcription failed");
            return PipelineResponse::failed(None, err.kind(), err.to_string());
        }
    };

    info!(characters = transcription.len(), "Transcription complete");
    run_text(state, transcription, format, cancel).await
}

/// Select tools for `text`, dispatch them in order and render each result
pub async fn run_text(
    state: &AppState,
    text: String,
    format: ResponseFormat,
    cancel: &CancellationToken,
) -> PipelineResponse {
    let selected = run_with_deadline(state.selector.select(&text), state.timeouts.selection, cancel)
        .await
        .map_err(ToolError::from)
        .and_then(|selection| selection);

    let selection = match selected {
        Ok(selection) => selection,
        Err(err) => {
            warn!(selector = state.selector.name(), error_kind = %err.kind(), "Tool selection failed");
            return PipelineResponse::failed(Some(text), err.kind(), err.to_string());
        }
    };

    let results = if selection.calls.is_empty() {
        vec![ResultEntry::reply(selection.reply.unwrap_or_default())]
    } else {
        state
            .dispatcher
            .dispatch_batch(&selection.calls, cancel)
            .await
            .into_iter()
            .map(|record| ResultEntry::render(record, format))
            .collect()
    };

    PipelineResponse {
        transcription: Some(text),
        results,
        error: None,
        error_kind: None,
    }
}
