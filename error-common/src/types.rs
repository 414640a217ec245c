use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::codes;

/// Closed classification of every failure the pipeline can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No patient matched the requested name fragment
    NotFound,
    /// Records backend or object storage failure (network, query, constraint)
    BackendFailure,
    /// Tool call named an operation that is not registered
    UnknownOperation,
    /// Tool call arguments are missing or have the wrong type
    InvalidArguments,
    /// Transcription or language-model service failure
    UpstreamFailure,
    /// A downstream call exceeded its deadline
    Timeout,
    /// The owning request was cancelled before the call completed
    Cancelled,
    /// Required configuration is missing or malformed
    Configuration,
}

impl ErrorKind {
    /// Stable machine-readable code for this kind
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => codes::records::PATIENT_NOT_FOUND,
            ErrorKind::BackendFailure => codes::records::BACKEND_FAILURE,
            ErrorKind::UnknownOperation => codes::tools::UNKNOWN_OPERATION,
            ErrorKind::InvalidArguments => codes::tools::INVALID_ARGUMENTS,
            ErrorKind::UpstreamFailure => codes::upstream::UPSTREAM_FAILURE,
            ErrorKind::Timeout => codes::upstream::TIMEOUT,
            ErrorKind::Cancelled => codes::upstream::CANCELLED,
            ErrorKind::Configuration => codes::system::CONFIGURATION,
        }
    }

    /// Snake-case name, identical to the serialized form
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::BackendFailure => "backend_failure",
            ErrorKind::UnknownOperation => "unknown_operation",
            ErrorKind::InvalidArguments => "invalid_arguments",
            ErrorKind::UpstreamFailure => "upstream_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every crate-level error so the kind can be recovered
/// without matching on foreign enums.
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

/// Top-level error used by binaries and by code that crosses crate boundaries
#[derive(Error, Debug)]
pub enum MedvoxError {
    /// A classified failure with a human-readable message
    #[error("{message}")]
    Classified { kind: ErrorKind, message: String },

    /// Server bind/serve failures
    #[error("Server error: {0}")]
    ServerError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MedvoxError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Classified {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Convert any classified crate error, keeping its kind
    pub fn classified<E: Classify + fmt::Display>(err: &E) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl Classify for MedvoxError {
    fn kind(&self) -> ErrorKind {
        match self {
            MedvoxError::Classified { kind, .. } => *kind,
            MedvoxError::ServerError(_) => ErrorKind::Configuration,
            MedvoxError::Other(_) => ErrorKind::BackendFailure,
        }
    }
}

impl MedvoxError {
    pub fn kind(&self) -> ErrorKind {
        Classify::kind(self)
    }
}

/// Result type alias for Medvox operations
pub type Result<T> = std::result::Result<T, MedvoxError>;

/// Log an error together with its kind and code
pub fn log_error<E: Classify + fmt::Display>(context: &str, error: &E) {
    let kind = error.kind();
    tracing::error!(
        context = context,
        error_kind = %kind,
        error_code = kind.code(),
        error = %error,
        "Medvox error occurred"
    );
}
