//! Operation catalogue, typed tool calls and the tool registry
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{ToolError, ToolResult};
use crate::protocol::{RawToolCall, ToolDefinition};

/// Scan type used by the MRI shortcut. Matched as a substring.
pub const MRI_SCAN_TYPE: &str = "MRI";

/// Every operation the language model may call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GetPatientRecords,
    GetPatientDob,
    GetMriScans,
    GetPatientScans,
    AddAnnotation,
    GetPatientAnnotations,
}

/// One advertised parameter
struct Param {
    name: &'static str,
    description: &'static str,
    required: bool,
}

const NAME_PARAM: Param = Param {
    name: "name",
    description: "Patient name to search for",
    required: true,
};

impl Operation {
    /// Advertised order
    pub const ALL: [Operation; 6] = [
        Operation::GetPatientRecords,
        Operation::GetPatientDob,
        Operation::GetMriScans,
        Operation::GetPatientScans,
        Operation::AddAnnotation,
        Operation::GetPatientAnnotations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::GetPatientRecords => "get_patient_records",
            Operation::GetPatientDob => "get_patient_dob",
            Operation::GetMriScans => "get_mri_scans",
            Operation::GetPatientScans => "get_patient_scans",
            Operation::AddAnnotation => "add_annotation",
            Operation::GetPatientAnnotations => "get_patient_annotations",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Operation::GetPatientRecords => "Get complete patient records by name",
            Operation::GetPatientDob => "Get patient's date of birth by name",
            Operation::GetMriScans => "Get MRI scans specifically for a patient",
            Operation::GetPatientScans => {
                "Get all scans for a patient, optionally filtered by scan type"
            }
            Operation::AddAnnotation => "Add an annotation/note for a patient",
            Operation::GetPatientAnnotations => "Get all annotations for a patient",
        }
    }

    fn params(self) -> Vec<Param> {
        match self {
            Operation::GetPatientRecords
            | Operation::GetPatientDob
            | Operation::GetMriScans
            | Operation::GetPatientAnnotations => vec![NAME_PARAM],
            Operation::GetPatientScans => vec![
                NAME_PARAM,
                Param {
                    name: "scan_type",
                    description: "Type of scan to filter by (optional)",
                    required: false,
                },
            ],
            Operation::AddAnnotation => vec![
                Param {
                    name: "patient_name",
                    description: "Patient name",
                    required: true,
                },
                Param {
                    name: "note",
                    description: "The annotation/note text",
                    required: true,
                },
                Param {
                    name: "scan_id",
                    description: "Optional scan ID to associate with the annotation",
                    required: false,
                },
            ],
        }
    }

    /// JSON Schema for the operation's arguments
    pub fn parameters_schema(self) -> Value {
        let params = self.params();
        let mut properties = Map::new();
        for param in &params {
            properties.insert(
                param.name.to_string(),
                json!({ "type": "string", "description": param.description }),
            );
        }
        let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ToolError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| ToolError::UnknownOperation(name.to_string()))
    }
}

/// A validated tool call with typed arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    GetPatientRecords { name: String },
    GetPatientDob { name: String },
    GetMriScans { name: String },
    GetPatientScans { name: String, scan_type: Option<String> },
    AddAnnotation {
        patient_name: String,
        note: String,
        scan_id: Option<String>,
    },
    GetPatientAnnotations { name: String },
}

impl ToolCall {
    /// Validate a raw call. Unknown names fail with `UnknownOperation`;
    /// missing or non-scalar required arguments with `InvalidArguments`.
    /// Optional arguments that are absent, null or blank are treated as
    /// not given.
    pub fn parse(raw: &RawToolCall) -> ToolResult<Self> {
        let operation: Operation = raw.name.parse()?;
        let args = Arguments::new(operation, &raw.arguments)?;

        let call = match operation {
            Operation::GetPatientRecords => ToolCall::GetPatientRecords {
                name: args.required("name")?,
            },
            Operation::GetPatientDob => ToolCall::GetPatientDob {
                name: args.required("name")?,
            },
            Operation::GetMriScans => ToolCall::GetMriScans {
                name: args.required("name")?,
            },
            Operation::GetPatientScans => ToolCall::GetPatientScans {
                name: args.required("name")?,
                scan_type: args.optional("scan_type")?,
            },
            Operation::AddAnnotation => ToolCall::AddAnnotation {
                patient_name: args.required("patient_name")?,
                note: args.required("note")?,
                scan_id: args.optional("scan_id")?,
            },
            Operation::GetPatientAnnotations => ToolCall::GetPatientAnnotations {
                name: args.required("name")?,
            },
        };
        Ok(call)
    }

    pub fn operation(&self) -> Operation {
        match self {
            ToolCall::GetPatientRecords { .. } => Operation::GetPatientRecords,
            ToolCall::GetPatientDob { .. } => Operation::GetPatientDob,
            ToolCall::GetMriScans { .. } => Operation::GetMriScans,
            ToolCall::GetPatientScans { .. } => Operation::GetPatientScans,
            ToolCall::AddAnnotation { .. } => Operation::AddAnnotation,
            ToolCall::GetPatientAnnotations { .. } => Operation::GetPatientAnnotations,
        }
    }
}

struct Arguments<'a> {
    operation: Operation,
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Arguments<'a> {
    fn new(operation: Operation, value: &'a Value) -> ToolResult<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                operation,
                map: Some(map),
            }),
            Value::Null => Ok(Self { operation, map: None }),
            other => Err(ToolError::invalid_arguments(
                operation.name(),
                format!("expected an argument object, got {}", type_name(other)),
            )),
        }
    }

    fn scalar(&self, key: &str) -> ToolResult<Option<String>> {
        let value = match self.map.and_then(|m| m.get(key)) {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(ToolError::invalid_arguments(
                    self.operation.name(),
                    format!("argument '{}' must be a string, got {}", key, type_name(other)),
                ))
            }
        };
        Ok(Some(text).filter(|t| !t.is_empty()))
    }

    fn required(&self, key: &str) -> ToolResult<String> {
        self.scalar(key)?.ok_or_else(|| {
            ToolError::invalid_arguments(
                self.operation.name(),
                format!("missing required argument '{}'", key),
            )
        })
    }

    fn optional(&self, key: &str) -> ToolResult<Option<String>> {
        self.scalar(key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Registry of advertised tools, generated from [`Operation::ALL`]
#[derive(Debug, Clone)]
pub struct ToolsRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolsRegistry {
    pub fn new() -> Self {
        Self {
            tools: Operation::ALL.into_iter().map(Operation::definition).collect(),
        }
    }

    /// List all available tools
    pub fn list(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Tools in chat-completions `tools` format
    pub fn function_tools(&self) -> Vec<Value> {
        self.tools.iter().map(ToolDefinition::to_function_tool).collect()
    }
}

impl Default for ToolsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error_common::{Classify, ErrorKind};

    fn raw(name: &str, arguments: Value) -> RawToolCall {
        RawToolCall::new(name, arguments)
    }

    #[test]
    fn registry_and_parser_agree_on_every_operation() {
        let registry = ToolsRegistry::new();
        assert_eq!(registry.list().len(), Operation::ALL.len());

        for definition in registry.list() {
            let op: Operation = definition.name.parse().unwrap();
            assert_eq!(op.name(), definition.name);
        }
    }

    #[test]
    fn add_annotation_schema_requires_patient_and_note() {
        let schema = Operation::AddAnnotation.parameters_schema();
        assert_eq!(schema["required"], json!(["patient_name", "note"]));
        assert!(schema["properties"]["scan_id"].is_object());
    }

    #[test]
    fn function_tool_shape() {
        let tool = Operation::GetPatientDob.definition().to_function_tool();
        assert_eq!(tool["type"], "function");
        assert_eq!(tool["function"]["name"], "get_patient_dob");
        assert_eq!(tool["function"]["parameters"]["required"], json!(["name"]));
    }

    #[test]
    fn parses_optional_arguments() {
        let call = ToolCall::parse(&raw(
            "get_patient_scans",
            json!({ "name": "Steven", "scan_type": "CT" }),
        ))
        .unwrap();
        assert_eq!(
            call,
            ToolCall::GetPatientScans {
                name: "Steven".to_string(),
                scan_type: Some("CT".to_string())
            }
        );

        let call = ToolCall::parse(&raw("get_patient_scans", json!({ "name": "Steven", "scan_type": "" })))
            .unwrap();
        assert_eq!(
            call,
            ToolCall::GetPatientScans {
                name: "Steven".to_string(),
                scan_type: None
            }
        );
    }

    #[test]
    fn unknown_operation_is_classified() {
        let err = ToolCall::parse(&raw("delete_patient", json!({}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownOperation);
        assert_eq!(err.to_string(), "Unknown function: delete_patient");
    }

    #[test]
    fn missing_or_blank_required_argument_is_invalid() {
        for args in [json!({}), json!({ "name": "   " }), Value::Null] {
            let err = ToolCall::parse(&raw("get_patient_dob", args)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArguments);
        }

        let err = ToolCall::parse(&raw("add_annotation", json!({ "patient_name": "Steven" }))).unwrap_err();
        assert!(err.to_string().contains("'note'"));
    }

    #[test]
    fn structured_argument_values_are_rejected() {
        let err = ToolCall::parse(&raw("get_patient_dob", json!({ "name": ["Steven"] }))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);

        let err = ToolCall::parse(&raw("get_patient_dob", json!("Steven"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    }
}
