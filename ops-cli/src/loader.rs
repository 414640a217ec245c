//! Dataset loader
//!
//! Each row becomes a patient, an uploaded scan image, an `MRI` scan dated
//! today and one annotation on that scan. Rows are independent: a missing
//! image skips the row, any other failure is recorded and the next row is
//! loaded.

use chrono::{NaiveDate, Utc};
use error_common::Classify;
use records_store::{NewAnnotation, NewPatient, NewScan, ObjectStore, RecordsBackend};
use records_tools::tools::MRI_SCAN_TYPE;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dataset::PatientRow;
use crate::error::LoadError;

/// Identifiers created for a loaded row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedRow {
    pub patient_id: String,
    pub scan_id: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    Loaded(LoadedRow),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    pub line: usize,
    pub name: String,
    pub status: RowStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl LoadSummary {
    fn record(&mut self, status: &RowStatus) {
        match status {
            RowStatus::Loaded(_) => self.loaded += 1,
            RowStatus::Skipped(_) => self.skipped += 1,
            RowStatus::Failed(_) => self.failed += 1,
        }
    }
}

pub struct Loader {
    backend: Arc<dyn RecordsBackend>,
    store: Arc<dyn ObjectStore>,
    /// Scan file paths in the dataset are relative to this directory
    data_dir: PathBuf,
}

impl Loader {
    pub fn new(backend: Arc<dyn RecordsBackend>, store: Arc<dyn ObjectStore>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            store,
            data_dir: data_dir.into(),
        }
    }

    /// Load every row in order, reporting each one to `on_row` as it finishes
    pub async fn load_all<F>(&self, rows: &[PatientRow], mut on_row: F) -> LoadSummary
    where
        F: FnMut(&RowReport),
    {
        let mut summary = LoadSummary::default();

        for row in rows {
            let status = match self.load_row(row).await {
                Ok(loaded) => RowStatus::Loaded(loaded),
                Err(err @ LoadError::MissingScanFile(_)) => RowStatus::Skipped(err.to_string()),
                Err(err) => {
                    warn!(line = row.line, error_kind = %err.kind(), "Row failed to load");
                    RowStatus::Failed(err.to_string())
                }
            };
            summary.record(&status);
            on_row(&RowReport {
                line: row.line,
                name: row.name.clone(),
                status,
            });
        }

        summary
    }

    /// Insert one row. Nothing is written when the scan image is missing or
    /// the date of birth does not parse.
    pub async fn load_row(&self, row: &PatientRow) -> Result<LoadedRow, LoadError> {
        let dob = NaiveDate::parse_from_str(row.dob.trim(), "%Y-%m-%d")
            .map_err(|_| LoadError::InvalidDob(row.dob.clone()))?;

        let path = self.data_dir.join(&row.scan_file);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {}
            Ok(false) => return Err(LoadError::MissingScanFile(path)),
            Err(source) => return Err(LoadError::Io { path, source }),
        }
        let image = tokio::fs::read(&path)
            .await
            .map_err(|source| LoadError::Io { path: path.clone(), source })?;

        let patient = self
            .backend
            .insert_patient(NewPatient {
                id: Uuid::new_v4().to_string(),
                name: row.name.clone(),
                dob,
                record: row.record.clone(),
                created_at: Utc::now(),
            })
            .await?;

        let object_path = format!("{}_{}", patient.id, file_name(&path));
        let image_url = self.store.upload(&object_path, image, content_type(&path)).await?;
        debug!(line = row.line, object_path = %object_path, "Uploaded scan image");

        let scan = self
            .backend
            .insert_scan(NewScan {
                id: Uuid::new_v4().to_string(),
                patient_id: patient.id.clone(),
                scan_type: MRI_SCAN_TYPE.to_string(),
                scan_date: Utc::now().date_naive(),
                image_url: image_url.clone(),
            })
            .await?;

        self.backend
            .insert_annotation(NewAnnotation {
                id: Some(Uuid::new_v4().to_string()),
                ..NewAnnotation::now(patient.id.clone(), row.annotation.clone(), Some(scan.id.clone()))
            })
            .await?;

        Ok(LoadedRow {
            patient_id: patient.id,
            scan_id: scan.id,
            image_url,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}
