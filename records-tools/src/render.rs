//! Response rendering for tool outcomes
//!
//! Two targets: a multi-line text block per operation, or a flat JSON object
//! with explicit keys. A failure renders as the single line
//! `Error: <message>` for either target.

use chrono::{DateTime, Utc};
use records_store::{Annotation, Patient, Scan};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Write;

use crate::protocol::{ToolOutcome, ToolOutput};

const NOT_AVAILABLE: &str = "N/A";

/// Rendering target chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// Render an outcome for the requested target
pub fn render_outcome(format: ResponseFormat, outcome: &ToolOutcome) -> Value {
    match format {
        ResponseFormat::Text => Value::String(render_text(outcome)),
        ResponseFormat::Json => render_json(outcome),
    }
}

/// Human-readable rendering
pub fn render_text(outcome: &ToolOutcome) -> String {
    let output = match outcome {
        Ok(output) => output,
        Err(failure) => return render_error(&failure.message),
    };

    match output {
        ToolOutput::Patients { patients } => render_patients_text(patients),
        ToolOutput::DateOfBirth { name, dob } => {
            format!("Patient: {}\nDate of Birth: {}", name, dob)
        }
        ToolOutput::Scans {
            patient_name,
            scans,
            mri_only,
        } => render_scans_text(patient_name, scans, *mri_only),
        ToolOutput::Annotations {
            patient_name,
            annotations,
        } => render_annotations_text(patient_name, annotations),
        ToolOutput::AnnotationAdded { annotations } => match annotations.first() {
            Some(annotation) => format!("Annotation added successfully! ID: {}", annotation.id),
            None => "Annotation added successfully!".to_string(),
        },
    }
}

/// Machine-oriented rendering with flat, explicit keys
pub fn render_json(outcome: &ToolOutcome) -> Value {
    let output = match outcome {
        Ok(output) => output,
        Err(failure) => return Value::String(render_error(&failure.message)),
    };

    match output {
        ToolOutput::Patients { patients } => json!({
            "patients": patients.iter().map(patient_json).collect::<Vec<_>>(),
            "count": patients.len(),
        }),
        ToolOutput::DateOfBirth { name, dob } => json!({
            "patient_name": name,
            "dob": dob,
        }),
        ToolOutput::Scans {
            patient_name, scans, ..
        } => {
            // Scans arrive newest first; the flat keys describe the newest one
            let latest = scans.first();
            json!({
                "patient_name": patient_name,
                "scan_type": latest.map(|s| s.scan_type.as_str()),
                "scan_date": latest.map(|s| s.scan_date),
                "image_url": latest.and_then(|s| s.image_url.as_deref()),
                "scan_id": latest.map(|s| s.id.as_str()),
                "scans": scans.iter().map(scan_json).collect::<Vec<_>>(),
                "count": scans.len(),
            })
        }
        ToolOutput::Annotations {
            patient_name,
            annotations,
        } => json!({
            "patient_name": patient_name,
            "annotations": annotations.iter().map(annotation_json).collect::<Vec<_>>(),
            "count": annotations.len(),
        }),
        ToolOutput::AnnotationAdded { annotations } => match annotations.first() {
            Some(annotation) => json!({
                "annotation_id": annotation.id,
                "patient_id": annotation.patient_id,
                "scan_id": annotation.scan_id,
                "note": annotation.note,
                "created_at": annotation.created_at.map(|t| t.to_rfc3339()),
            }),
            None => json!({ "annotation_id": null }),
        },
    }
}

fn render_error(message: &str) -> String {
    format!("Error: {}", message)
}

fn render_patients_text(patients: &[Patient]) -> String {
    if patients.is_empty() {
        return "No patients found.".to_string();
    }

    let mut out = String::from("Patient Records:\n");
    for patient in patients {
        let _ = writeln!(out, "- Name: {}", patient.name);
        let _ = writeln!(out, "  DOB: {}", patient.dob);
        let _ = writeln!(out, "  Record: {}", patient.record.as_deref().unwrap_or(NOT_AVAILABLE));
        let _ = writeln!(out, "  ID: {}\n", patient.id);
    }
    out
}

fn render_scans_text(patient_name: &str, scans: &[Scan], mri_only: bool) -> String {
    let label = if mri_only { "MRI scans" } else { "scans" };
    if scans.is_empty() {
        return format!("No {} found for {}.", label, patient_name);
    }

    let heading = if mri_only { "MRI Scans" } else { "Scans" };
    let mut out = format!("{} for {}:\n", heading, patient_name);
    for scan in scans {
        let _ = writeln!(out, "- Type: {}", scan.scan_type);
        let _ = writeln!(out, "  Date: {}", scan.scan_date);
        let _ = writeln!(out, "  Image URL: {}", scan.image_url.as_deref().unwrap_or(NOT_AVAILABLE));
        let _ = writeln!(out, "  Scan ID: {}\n", scan.id);
    }
    out
}

fn render_annotations_text(patient_name: &str, annotations: &[Annotation]) -> String {
    if annotations.is_empty() {
        return format!("No annotations found for {}.", patient_name);
    }

    let mut out = format!("Annotations for {}:\n", patient_name);
    for annotation in annotations {
        let _ = writeln!(out, "- Note: {}", annotation.note);
        let _ = writeln!(out, "  Created: {}", format_timestamp(annotation.created_at.as_ref()));
        let _ = writeln!(out, "  ID: {}\n", annotation.id);
    }
    out
}

fn format_timestamp(value: Option<&DateTime<Utc>>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |t| t.to_rfc3339())
}

fn patient_json(patient: &Patient) -> Value {
    json!({
        "patient_id": patient.id,
        "patient_name": patient.name,
        "dob": patient.dob,
        "record": patient.record,
    })
}

fn scan_json(scan: &Scan) -> Value {
    json!({
        "scan_id": scan.id,
        "scan_type": scan.scan_type,
        "scan_date": scan.scan_date,
        "image_url": scan.image_url,
    })
}

fn annotation_json(annotation: &Annotation) -> Value {
    json!({
        "annotation_id": annotation.id,
        "note": annotation.note,
        "created_at": annotation.created_at.map(|t| t.to_rfc3339()),
        "scan_id": annotation.scan_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolFailure;
    use chrono::NaiveDate;
    use error_common::ErrorKind;
    use rstest::rstest;

    fn scan(id: &str, scan_type: &str) -> Scan {
        Scan {
            id: id.to_string(),
            patient_id: "p-1".to_string(),
            scan_type: scan_type.to_string(),
            scan_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            image_url: Some(format!("https://cdn.test/{}.jpg", id)),
        }
    }

    #[rstest]
    #[case(ErrorKind::NotFound, "Patient 'Steven Moss' not found")]
    #[case(ErrorKind::UnknownOperation, "Unknown function: drop_table")]
    #[case(ErrorKind::BackendFailure, "Backend error: connection refused")]
    #[case(ErrorKind::Timeout, "Timed out after 10s")]
    fn failures_render_as_single_error_line(#[case] kind: ErrorKind, #[case] message: &str) {
        let outcome: ToolOutcome = Err(ToolFailure::new(kind, message));
        let expected = format!("Error: {}", message);

        assert_eq!(render_text(&outcome), expected);
        assert_eq!(render_json(&outcome), Value::String(expected.clone()));
        assert_eq!(render_outcome(ResponseFormat::Json, &outcome), Value::String(expected));
    }

    #[rstest]
    #[case(true, "MRI Scans for Steven Moss:\n")]
    #[case(false, "Scans for Steven Moss:\n")]
    fn scan_text_heading_follows_operation(#[case] mri_only: bool, #[case] heading: &str) {
        let outcome: ToolOutcome = Ok(ToolOutput::Scans {
            patient_name: "Steven Moss".to_string(),
            scans: vec![scan("s-1", "MRI")],
            mri_only,
        });

        let text = render_text(&outcome);
        assert!(text.starts_with(heading));
        assert!(text.contains("  Image URL: https://cdn.test/s-1.jpg\n"));
        assert!(text.contains("  Scan ID: s-1\n\n"));
    }

    #[rstest]
    #[case(true, "No MRI scans found for Steven Moss.")]
    #[case(false, "No scans found for Steven Moss.")]
    fn empty_scans_text(#[case] mri_only: bool, #[case] expected: &str) {
        let outcome: ToolOutcome = Ok(ToolOutput::Scans {
            patient_name: "Steven Moss".to_string(),
            scans: vec![],
            mri_only,
        });
        assert_eq!(render_text(&outcome), expected);
    }

    #[test]
    fn dob_text_layout() {
        let outcome: ToolOutcome = Ok(ToolOutput::DateOfBirth {
            name: "Steven Moss".to_string(),
            dob: NaiveDate::from_ymd_opt(1985, 3, 2).unwrap(),
        });
        assert_eq!(render_text(&outcome), "Patient: Steven Moss\nDate of Birth: 1985-03-02");
    }

    #[test]
    fn scans_json_is_flat_for_newest_scan() {
        let outcome: ToolOutcome = Ok(ToolOutput::Scans {
            patient_name: "Steven Moss".to_string(),
            scans: vec![scan("s-2", "MRI"), scan("s-1", "CT")],
            mri_only: false,
        });

        let value = render_json(&outcome);
        assert_eq!(value["patient_name"], "Steven Moss");
        assert_eq!(value["scan_type"], "MRI");
        assert_eq!(value["scan_date"], "2024-05-01");
        assert_eq!(value["image_url"], "https://cdn.test/s-2.jpg");
        assert_eq!(value["scan_id"], "s-2");
        assert_eq!(value["count"], 2);
    }

    #[test]
    fn patients_text_uses_placeholder_for_missing_record() {
        let outcome: ToolOutcome = Ok(ToolOutput::Patients {
            patients: vec![Patient {
                id: "p-1".to_string(),
                name: "Jane Doe".to_string(),
                dob: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
                record: None,
                created_at: None,
            }],
        });

        assert_eq!(
            render_text(&outcome),
            "Patient Records:\n- Name: Jane Doe\n  DOB: 1990-06-15\n  Record: N/A\n  ID: p-1\n\n"
        );
    }
}
