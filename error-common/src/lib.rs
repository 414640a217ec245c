//! Common error handling utilities for Medvox
//!
//! Every crate in the workspace reports failures through its own `thiserror`
//! enum, but all of them classify those failures with the same closed
//! [`ErrorKind`] taxonomy defined here. The kind travels with a failure all
//! the way to the HTTP response so that callers can branch on it instead of
//! parsing message text.
//!
//! # Error Categories
//!
//! - **NotFound**: no patient matched a name fragment
//! - **BackendFailure**: the records backend or object storage failed
//! - **UnknownOperation**: a tool call named an operation that does not exist
//! - **InvalidArguments**: a tool call is missing or mistypes an argument
//! - **UpstreamFailure**: the transcription or language-model service failed
//! - **Timeout** / **Cancelled**: a downstream call exceeded its deadline or
//!   the request was abandoned
//! - **Configuration**: required settings are missing at startup
//!
//! # Example
//!
//! ```rust
//! use error_common::{ErrorKind, MedvoxError};
//!
//! let err = MedvoxError::new(ErrorKind::NotFound, "Patient 'Steven' not found");
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//! assert_eq!(err.kind().code(), "RECORDS_1001");
//! ```

pub mod codes;
pub mod types;

pub use codes::*;
pub use types::*;
