use error_common::{Classify, ErrorKind};
use records_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Dataset file failures
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("Missing column '{0}' in CSV header")]
    MissingColumn(String),

    #[error("Empty CSV file")]
    Empty,
}

pub type DatasetResult<T> = std::result::Result<T, DatasetError>;

/// Failure while loading a single dataset row
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Scan file not found: {0}")]
    MissingScanFile(PathBuf),

    #[error("Invalid date of birth '{0}', expected YYYY-MM-DD")]
    InvalidDob(String),

    #[error("Failed to read scan file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for LoadError {
    fn kind(&self) -> ErrorKind {
        match self {
            LoadError::MissingScanFile(_) => ErrorKind::NotFound,
            LoadError::InvalidDob(_) => ErrorKind::InvalidArguments,
            LoadError::Io { .. } => ErrorKind::BackendFailure,
            LoadError::Store(err) => err.kind(),
        }
    }
}
