//! Medvox Server - voice and text queries over patient records
//!
//! `POST /get_data` accepts a recording, transcribes it, lets a language
//! model choose record tools and returns one rendered result per tool call.
//! `POST /query` does the same for typed text, and `/tools` exposes the tool
//! registry and direct dispatch.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;

// Re-export commonly used types
pub use config::{PipelineTimeouts, ServerConfig};
pub use error::*;
pub use pipeline::{PipelineResponse, ResultEntry};
pub use state::AppState;

use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer())
                .layer(from_fn(middleware::request_timing_middleware))
                .layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .with_state(state)
}
