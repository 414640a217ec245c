use error_common::{Classify, ErrorKind};
use records_store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown function: {0}")]
    UnknownOperation(String),

    #[error("Invalid arguments for {operation}: {message}")]
    InvalidArguments { operation: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Language-model service answered with an error or an unusable reply
    #[error("Language model error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    pub fn invalid_arguments(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

impl Classify for ToolError {
    fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnknownOperation(_) => ErrorKind::UnknownOperation,
            ToolError::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            ToolError::Store(err) => err.kind(),
            ToolError::Config(_) => ErrorKind::Configuration,
            ToolError::Timeout(_) => ErrorKind::Timeout,
            ToolError::Cancelled => ErrorKind::Cancelled,
            ToolError::Upstream(_) | ToolError::Network(_) | ToolError::Serialization(_) => {
                ErrorKind::UpstreamFailure
            }
        }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Failure side of a tool outcome: the kind callers branch on plus the
/// message shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ToolError> for ToolFailure {
    fn from(err: ToolError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<StoreError> for ToolFailure {
    fn from(err: StoreError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}
