use records_store::{NewAnnotation, PatientDirectory, RecordsBackend, StoreError};
use std::sync::Arc;
use tracing::{debug, info};

use crate::protocol::{ToolOutcome, ToolOutput};
use crate::tools::{ToolCall, MRI_SCAN_TYPE};

/// The six record operations.
///
/// Every operation except `get_patient_records` first resolves the name
/// fragment through the [`PatientDirectory`]; all failures come back as a
/// classified [`ToolFailure`](crate::ToolFailure), never as a panic or an
/// unhandled error.
#[derive(Clone)]
pub struct RecordQueries {
    directory: PatientDirectory,
}

impl RecordQueries {
    pub fn new(backend: Arc<dyn RecordsBackend>) -> Self {
        Self {
            directory: PatientDirectory::new(backend),
        }
    }

    pub fn directory(&self) -> &PatientDirectory {
        &self.directory
    }

    fn backend(&self) -> &Arc<dyn RecordsBackend> {
        self.directory.backend()
    }

    /// Run a validated call
    pub async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match call {
            ToolCall::GetPatientRecords { name } => self.get_patient_records(name).await,
            ToolCall::GetPatientDob { name } => self.get_patient_dob(name).await,
            ToolCall::GetMriScans { name } => self.get_mri_scans(name).await,
            ToolCall::GetPatientScans { name, scan_type } => {
                self.get_patient_scans(name, scan_type.as_deref()).await
            }
            ToolCall::AddAnnotation {
                patient_name,
                note,
                scan_id,
            } => self.add_annotation(patient_name, note, scan_id.clone()).await,
            ToolCall::GetPatientAnnotations { name } => self.get_patient_annotations(name).await,
        }
    }

    /// All patients whose name contains `name`. No match is `NotFound`.
    pub async fn get_patient_records(&self, name: &str) -> ToolOutcome {
        let patients = self.directory.search(name).await?;
        if patients.is_empty() {
            return Err(StoreError::patient_not_found(name).into());
        }
        debug!(matches = patients.len(), "Patient records fetched");
        Ok(ToolOutput::Patients { patients })
    }

    pub async fn get_patient_dob(&self, name: &str) -> ToolOutcome {
        let patient = self.directory.resolve_patient(name).await?;
        Ok(ToolOutput::DateOfBirth {
            name: patient.name,
            dob: patient.dob,
        })
    }

    /// Scans of the resolved patient, narrowed by a scan-type substring
    pub async fn get_patient_scans(&self, name: &str, scan_type: Option<&str>) -> ToolOutcome {
        self.scans(name, scan_type, false).await
    }

    /// Shortcut for scans whose type contains "MRI"
    pub async fn get_mri_scans(&self, name: &str) -> ToolOutcome {
        self.scans(name, Some(MRI_SCAN_TYPE), true).await
    }

    async fn scans(&self, name: &str, scan_type: Option<&str>, mri_only: bool) -> ToolOutcome {
        let patient = self.directory.resolve(name).await?;
        let scans = self.backend().scans_for_patient(&patient.id, scan_type.map(str::to_string)).await?;
        debug!(patient_id = %patient.id, scans = scans.len(), "Scans fetched");
        Ok(ToolOutput::Scans {
            patient_name: patient.name,
            scans,
            mri_only,
        })
    }

    pub async fn get_patient_annotations(&self, name: &str) -> ToolOutcome {
        let patient = self.directory.resolve(name).await?;
        let annotations = self.backend().annotations_for_patient(&patient.id).await?;
        Ok(ToolOutput::Annotations {
            patient_name: patient.name,
            annotations,
        })
    }

    /// Append a note to the resolved patient, stamped with the current time
    pub async fn add_annotation(
        &self,
        patient_name: &str,
        note: &str,
        scan_id: Option<String>,
    ) -> ToolOutcome {
        let patient = self.directory.resolve(patient_name).await?;
        let annotations = self
            .backend()
            .insert_annotation(NewAnnotation::now(&patient.id, note, scan_id))
            .await?;
        info!(patient_id = %patient.id, "Annotation added");
        Ok(ToolOutput::AnnotationAdded { annotations })
    }
}
