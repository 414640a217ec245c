use error_common::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// No patient matched the name fragment
    #[error("Patient '{fragment}' not found")]
    PatientNotFound { fragment: String },

    /// The backend answered with an error (query, constraint, auth)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Object storage rejected an upload
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn patient_not_found(fragment: impl Into<String>) -> Self {
        Self::PatientNotFound {
            fragment: fragment.into(),
        }
    }
}

impl Classify for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::PatientNotFound { .. } => ErrorKind::NotFound,
            StoreError::Config(_) => ErrorKind::Configuration,
            _ => ErrorKind::BackendFailure,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
