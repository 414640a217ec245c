use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use records_tools::ResponseFormat;
use serde::{Deserialize, Serialize};
use tracing::debug;
use voice_recognition_service::AudioInput;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::{self, PipelineResponse, RequestScope};
use crate::state::AppState;

/// Multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio";

/// `?format=text|json`
#[derive(Debug, Default, Deserialize)]
pub struct FormatParams {
    #[serde(default)]
    pub format: ResponseFormat,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextQueryRequest {
    pub text: String,
}

/// Transcribe an uploaded recording and answer it
pub async fn get_data(
    State(state): State<AppState>,
    Query(params): Query<FormatParams>,
    mut multipart: Multipart,
) -> ApiResult<Json<PipelineResponse>> {
    let mut audio = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("audio").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        let mut input = AudioInput::new(data.to_vec(), file_name);
        if let Some(content_type) = content_type {
            input = input.with_content_type(content_type);
        }
        audio = Some(input);
        break;
    }

    let audio = audio.ok_or_else(|| ApiError::validation(format!("multipart field '{}' is required", AUDIO_FIELD)))?;
    debug!(audio_size = audio.len(), format = ?params.format, "Audio query received");

    let scope = RequestScope::new(state.timeouts.request);
    let response = pipeline::run_audio(&state, audio, params.format, scope.token()).await;
    Ok(Json(response))
}

/// Answer a typed query; same pipeline without transcription
pub async fn text_query(
    State(state): State<AppState>,
    Query(params): Query<FormatParams>,
    Json(request): Json<TextQueryRequest>,
) -> ApiResult<Json<PipelineResponse>> {
    let text = request.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::validation("text must not be empty"));
    }

    let scope = RequestScope::new(state.timeouts.request);
    let response = pipeline::run_text(&state, text, params.format, scope.token()).await;
    Ok(Json(response))
}
