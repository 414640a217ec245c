use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Patient row (`patients` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub dob: NaiveDate,
    #[serde(default)]
    pub record: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Scan row (`scans` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub id: String,
    pub patient_id: String,
    pub scan_type: String,
    pub scan_date: NaiveDate,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Annotation row (`annotations` table). Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub scan_id: Option<String>,
    pub note: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Identifier and canonical display name of a resolved patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRef {
    pub id: String,
    pub name: String,
}

impl From<&Patient> for PatientRef {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id.clone(),
            name: patient.name.clone(),
        }
    }
}

/// Annotation to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnotation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<String>,
    pub note: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl NewAnnotation {
    /// Annotation stamped with the current time; the backend assigns the id
    pub fn now(patient_id: impl Into<String>, note: impl Into<String>, scan_id: Option<String>) -> Self {
        Self {
            id: None,
            patient_id: patient_id.into(),
            scan_id,
            note: note.into(),
            created_at: Utc::now(),
        }
    }
}

/// Patient to be inserted by the data loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPatient {
    pub id: String,
    pub name: String,
    pub dob: NaiveDate,
    pub record: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Scan to be inserted by the data loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScan {
    pub id: String,
    pub patient_id: String,
    pub scan_type: String,
    pub scan_date: NaiveDate,
    pub image_url: String,
}

/// Backend timestamps arrive either with an offset (`timestamptz`) or
/// without one (`timestamp`); the latter are taken as UTC.
pub mod timestamp {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
                    .map(|naive| naive.and_utc())
                    .ok()
            })
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw {
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patient_accepts_naive_and_offset_timestamps() {
        let naive: Patient = serde_json::from_value(json!({
            "id": "p-1",
            "name": "Steven Moss",
            "dob": "1985-03-02",
            "record": "Migraine headaches. Complains of dizziness.",
            "created_at": "2025-09-27T14:03:11.512345"
        }))
        .unwrap();
        let offset: Patient = serde_json::from_value(json!({
            "id": "p-1",
            "name": "Steven Moss",
            "dob": "1985-03-02",
            "created_at": "2025-09-27T14:03:11.512345+00:00"
        }))
        .unwrap();

        assert_eq!(naive.created_at, offset.created_at);
        assert_eq!(naive.dob, NaiveDate::from_ymd_opt(1985, 3, 2).unwrap());
        assert_eq!(offset.record, None);
    }

    #[test]
    fn new_annotation_omits_absent_scan() {
        let annotation = NewAnnotation::now("p-1", "Improved mobility", None);
        let value = serde_json::to_value(&annotation).unwrap();
        assert!(value.get("scan_id").is_none());
        assert!(value.get("id").is_none());
        assert_eq!(value["note"], "Improved mobility");
    }
}
