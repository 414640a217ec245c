//! Wire shapes: tool definitions, raw tool calls, outcomes and envelopes
use chrono::NaiveDate;
use error_common::ErrorKind;
use records_store::{Annotation, Patient, Scan};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolFailure;

/// Tool definition advertised to the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Operation name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Parameter schema (JSON Schema object)
    pub parameters: Value,
}

impl ToolDefinition {
    /// Chat-completions `tools` entry
    pub fn to_function_tool(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Tool call as chosen by the language model, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToolCall {
    /// Operation name
    pub name: String,
    /// Argument mapping
    #[serde(default)]
    pub arguments: Value,
}

impl RawToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Successful result of a record query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolOutput {
    /// Every patient matching the name fragment
    Patients { patients: Vec<Patient> },
    /// Date of birth of the resolved patient
    DateOfBirth { name: String, dob: NaiveDate },
    /// Scans of the resolved patient; `mri_only` marks the MRI shortcut
    Scans {
        patient_name: String,
        scans: Vec<Scan>,
        mri_only: bool,
    },
    Annotations {
        patient_name: String,
        annotations: Vec<Annotation>,
    },
    /// Rows written by `add_annotation`
    AnnotationAdded { annotations: Vec<Annotation> },
}

impl ToolOutput {
    /// Canonical patient name, for outputs scoped to one patient
    pub fn patient_name(&self) -> Option<&str> {
        match self {
            ToolOutput::Scans { patient_name, .. } | ToolOutput::Annotations { patient_name, .. } => {
                Some(patient_name)
            }
            ToolOutput::Patients { .. }
            | ToolOutput::DateOfBirth { .. }
            | ToolOutput::AnnotationAdded { .. } => None,
        }
    }

    /// Payload carried in the `data` field of an [`Envelope`]
    pub fn data(&self) -> Value {
        match self {
            ToolOutput::Patients { patients } => json!(patients),
            ToolOutput::DateOfBirth { name, dob } => json!({ "name": name, "dob": dob }),
            ToolOutput::Scans { scans, .. } => json!(scans),
            ToolOutput::Annotations { annotations, .. } => json!(annotations),
            ToolOutput::AnnotationAdded { annotations } => json!(annotations),
        }
    }
}

/// Result of one dispatched tool call
pub type ToolOutcome = Result<ToolOutput, ToolFailure>;

/// Uniform `{success, data|error}` wrapper.
///
/// `error_kind` lets callers branch on the failure class instead of parsing
/// the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
}

impl From<&ToolOutcome> for Envelope {
    fn from(outcome: &ToolOutcome) -> Self {
        match outcome {
            Ok(output) => Self {
                success: true,
                data: Some(output.data()),
                error: None,
                error_kind: None,
                patient_name: output.patient_name().map(str::to_string),
            },
            Err(failure) => Self {
                success: false,
                data: None,
                error: Some(failure.message.clone()),
                error_kind: Some(failure.kind),
                patient_name: None,
            },
        }
    }
}
