use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{Annotation, NewAnnotation, NewPatient, NewScan, Patient, Scan};

/// Storage interface for patients, scans and annotations.
///
/// Every name or type filter is a case-insensitive substring match.
/// Implementations must return patients ordered by `id` ascending so that
/// the first element is the same on every backend.
#[async_trait]
pub trait RecordsBackend: Send + Sync {
    /// Patients whose display name contains `fragment`, ordered by id
    async fn find_patients(&self, fragment: &str) -> StoreResult<Vec<Patient>>;

    /// Scans owned by a patient, optionally narrowed by scan type.
    /// Newest scan first, ties broken by id.
    async fn scans_for_patient(
        &self,
        patient_id: &str,
        scan_type: Option<String>,
    ) -> StoreResult<Vec<Scan>>;

    /// Annotations owned by a patient, oldest first
    async fn annotations_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Annotation>>;

    /// Append an annotation and return the stored row(s)
    async fn insert_annotation(&self, annotation: NewAnnotation) -> StoreResult<Vec<Annotation>>;

    /// Insert a patient (data loading)
    async fn insert_patient(&self, patient: NewPatient) -> StoreResult<Patient>;

    /// Insert a scan (data loading)
    async fn insert_scan(&self, scan: NewScan) -> StoreResult<Scan>;
}

/// Case-insensitive substring test shared by the in-memory backend and the
/// tests that check PostgREST parity.
///
/// `*` in the needle is ignored, as in [`crate::postgrest::ilike_contains`].
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle: String = needle.chars().filter(|c| *c != '*').collect();
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
