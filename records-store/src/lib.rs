//! Records storage for the Medvox pipeline
//!
//! Patients, scans and annotations live in a hosted Postgres database that
//! is reached through its PostgREST interface (Supabase). Scan images live in
//! an object-storage bucket next to it. This crate owns:
//!
//! - the data model ([`Patient`], [`Scan`], [`Annotation`])
//! - the [`RecordsBackend`] seam, with a PostgREST implementation and an
//!   in-memory implementation for tests and local runs
//! - the [`PatientDirectory`] gateway that resolves a spoken name fragment to
//!   a single patient
//! - the [`ObjectStore`] seam used when loading scan images
//!
//! Name lookups are case-insensitive substring matches ordered by patient
//! identifier, so "the first match" is deterministic across backends.

pub mod backend;
pub mod config;
pub mod directory;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgrest;
pub mod storage;

pub use backend::*;
pub use config::*;
pub use directory::*;
pub use error::*;
pub use memory::*;
pub use models::*;
pub use postgrest::PostgrestBackend;
pub use storage::*;
