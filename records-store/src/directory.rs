use std::sync::Arc;

use tracing::debug;

use crate::backend::RecordsBackend;
use crate::error::{StoreError, StoreResult};
use crate::models::{Patient, PatientRef};

/// Resolves spoken or typed name fragments to patients.
///
/// Matching is a case-insensitive substring test against display names.
/// Display names are not unique: when several patients match, the one with
/// the lowest identifier wins.
#[derive(Clone)]
pub struct PatientDirectory {
    backend: Arc<dyn RecordsBackend>,
}

impl PatientDirectory {
    pub fn new(backend: Arc<dyn RecordsBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn RecordsBackend> {
        &self.backend
    }

    /// Every patient matching `fragment`, ordered by identifier
    pub async fn search(&self, fragment: &str) -> StoreResult<Vec<Patient>> {
        self.backend.find_patients(fragment).await
    }

    /// First patient matching `fragment`, or `PatientNotFound`
    pub async fn resolve(&self, fragment: &str) -> StoreResult<PatientRef> {
        self.resolve_patient(fragment).await.map(|p| PatientRef::from(&p))
    }

    /// Like [`resolve`](Self::resolve) but returns the full row
    pub async fn resolve_patient(&self, fragment: &str) -> StoreResult<Patient> {
        let matches = self.search(fragment).await?;
        let total = matches.len();

        let patient = matches
            .into_iter()
            .min_by(|a, b| a.id.cmp(&b.id))
            .ok_or_else(|| StoreError::patient_not_found(fragment))?;

        debug!(patient_id = %patient.id, candidates = total, "Resolved patient");
        Ok(patient)
    }
}
