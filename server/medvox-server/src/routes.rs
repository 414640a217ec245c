use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{health, query, tools},
    state::AppState,
};

/// Liveness and health routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
}

/// Voice and text query routes
pub fn query_routes() -> Router<AppState> {
    Router::new()
        .route("/get_data", post(query::get_data))
        .route("/query", post(query::text_query))
}

/// Tool registry and direct dispatch routes
pub fn tool_routes() -> Router<AppState> {
    Router::new()
        .route("/tools", get(tools::list_tools))
        .route("/tools/call", post(tools::call_tool))
}

/// Create all routes
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .merge(query_routes())
        .merge(tool_routes())
}
