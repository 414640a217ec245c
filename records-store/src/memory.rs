use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::{contains_ignore_case, RecordsBackend};
use crate::error::{StoreError, StoreResult};
use crate::models::{Annotation, NewAnnotation, NewPatient, NewScan, Patient, Scan};

#[derive(Debug, Default)]
struct Tables {
    patients: Vec<Patient>,
    scans: Vec<Scan>,
    annotations: Vec<Annotation>,
}

/// In-memory records backend for testing and local development.
///
/// Enforces the same referential rules as the hosted schema: scans and
/// annotations must reference an existing patient, and an annotation's scan
/// must exist when one is given.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordsBackend {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRecordsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a patient directly, bypassing validation of the id
    pub fn with_patient(self, patient: Patient) -> Self {
        self.tables.write().patients.push(patient);
        self
    }

    pub fn with_scan(self, scan: Scan) -> Self {
        self.tables.write().scans.push(scan);
        self
    }

    pub fn with_annotation(self, annotation: Annotation) -> Self {
        self.tables.write().annotations.push(annotation);
        self
    }

    pub fn patient_count(&self) -> usize {
        self.tables.read().patients.len()
    }

    pub fn scan_count(&self) -> usize {
        self.tables.read().scans.len()
    }

    pub fn annotation_count(&self) -> usize {
        self.tables.read().annotations.len()
    }
}

#[async_trait]
impl RecordsBackend for InMemoryRecordsBackend {
    async fn find_patients(&self, fragment: &str) -> StoreResult<Vec<Patient>> {
        let mut found: Vec<Patient> = self
            .tables
            .read()
            .patients
            .iter()
            .filter(|p| contains_ignore_case(&p.name, fragment))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn scans_for_patient(
        &self,
        patient_id: &str,
        scan_type: Option<String>,
    ) -> StoreResult<Vec<Scan>> {
        let mut found: Vec<Scan> = self
            .tables
            .read()
            .scans
            .iter()
            .filter(|s| s.patient_id == patient_id)
            .filter(|s| scan_type.as_deref().map_or(true, |t| contains_ignore_case(&s.scan_type, t)))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.scan_date.cmp(&a.scan_date).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn annotations_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Annotation>> {
        let mut found: Vec<Annotation> = self
            .tables
            .read()
            .annotations
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn insert_annotation(&self, annotation: NewAnnotation) -> StoreResult<Vec<Annotation>> {
        let mut tables = self.tables.write();

        if !tables.patients.iter().any(|p| p.id == annotation.patient_id) {
            return Err(StoreError::Backend(format!(
                "insert on table \"annotations\" violates foreign key constraint: patient {} does not exist",
                annotation.patient_id
            )));
        }
        if let Some(scan_id) = &annotation.scan_id {
            if !tables.scans.iter().any(|s| &s.id == scan_id) {
                return Err(StoreError::Backend(format!(
                    "insert on table \"annotations\" violates foreign key constraint: scan {} does not exist",
                    scan_id
                )));
            }
        }

        let stored = Annotation {
            id: annotation.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            patient_id: annotation.patient_id,
            scan_id: annotation.scan_id,
            note: annotation.note,
            created_at: Some(annotation.created_at),
        };
        tables.annotations.push(stored.clone());
        Ok(vec![stored])
    }

    async fn insert_patient(&self, patient: NewPatient) -> StoreResult<Patient> {
        let mut tables = self.tables.write();

        if tables.patients.iter().any(|p| p.id == patient.id) {
            return Err(StoreError::Backend(format!(
                "duplicate key value violates unique constraint \"patients_pkey\": {}",
                patient.id
            )));
        }

        let stored = Patient {
            id: patient.id,
            name: patient.name,
            dob: patient.dob,
            record: Some(patient.record),
            created_at: Some(patient.created_at),
        };
        tables.patients.push(stored.clone());
        Ok(stored)
    }

    async fn insert_scan(&self, scan: NewScan) -> StoreResult<Scan> {
        let mut tables = self.tables.write();

        if !tables.patients.iter().any(|p| p.id == scan.patient_id) {
            return Err(StoreError::Backend(format!(
                "insert on table \"scans\" violates foreign key constraint: patient {} does not exist",
                scan.patient_id
            )));
        }

        let stored = Scan {
            id: scan.id,
            patient_id: scan.patient_id,
            scan_type: scan.scan_type,
            scan_date: scan.scan_date,
            image_url: Some(scan.image_url),
        };
        tables.scans.push(stored.clone());
        Ok(stored)
    }
}
