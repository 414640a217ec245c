//! Operator CLI for Medvox
//!
//! The `medvox` binary covers the work that happens outside the HTTP server:
//!
//! - **query**: an interactive loop that sends typed questions through the
//!   same tool selector and dispatcher the server uses
//! - **generate**: write a synthetic patient dataset as CSV
//! - **renumber**: rewrite the `scan_file` column of a dataset sequentially
//! - **load**: insert every dataset row as patient, scan image, scan and
//!   annotation
//! - **check**: verify the speech-to-text credentials
//!
//! # Example Usage
//!
//! ```bash
//! medvox generate --count 1000 --start 10 --out patients.csv
//! medvox load --csv patients.csv
//! medvox query
//! ```

pub mod cli;
pub mod commands;
pub mod csv;
pub mod dataset;
pub mod error;
pub mod interactive;
pub mod loader;

pub use cli::*;
pub use dataset::{PatientRow, DATASET_COLUMNS};
pub use error::*;
pub use interactive::answer;
pub use loader::{LoadSummary, Loader, RowReport, RowStatus};
