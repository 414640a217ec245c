use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{api_success, ApiResponse};
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
    pub version: String,
    /// Uptime in seconds
    pub uptime: u64,
    /// Configured speech-to-text provider
    pub transcription_provider: String,
    /// Configured tool selector
    pub tool_selector: String,
    /// Number of advertised tools
    pub tools: usize,
}

/// Liveness probe
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello" }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    api_success(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.started_at.elapsed().as_secs(),
        transcription_provider: state.voice.provider_name().to_string(),
        tool_selector: state.selector.name().to_string(),
        tools: state.registry.list().len(),
    })
}
