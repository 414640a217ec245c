use axum::{
    extract::{Query, State},
    Json,
};
use records_tools::{DispatchRecord, Envelope, RawToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};

use crate::error::{api_success, ApiResponse};
use crate::handlers::query::FormatParams;
use crate::pipeline::{RequestScope, ResultEntry};
use crate::state::AppState;

/// Direct tool invocation result
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolCallResponse {
    #[serde(flatten)]
    pub entry: ResultEntry,
    /// Structured `{success, data|error}` envelope of the same outcome
    pub envelope: Envelope,
}

/// List the advertised tools
pub async fn list_tools(State(state): State<AppState>) -> Json<ApiResponse<Vec<ToolDefinition>>> {
    api_success(state.registry.list().to_vec())
}

/// Invoke one tool call without the language model
pub async fn call_tool(
    State(state): State<AppState>,
    Query(params): Query<FormatParams>,
    Json(call): Json<RawToolCall>,
) -> Json<ToolCallResponse> {
    let scope = RequestScope::new(state.timeouts.request);
    let outcome = state.dispatcher.dispatch_with_deadline(&call, scope.token()).await;
    let envelope = Envelope::from(&outcome);

    let record = DispatchRecord {
        operation: call.name.parse().ok(),
        call,
        outcome,
    };

    Json(ToolCallResponse {
        entry: ResultEntry::render(record, params.format),
        envelope,
    })
}
