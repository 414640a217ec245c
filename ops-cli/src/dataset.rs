//! Synthetic patient dataset
//!
//! The dataset is a CSV file with the columns in [`DATASET_COLUMNS`]. Each
//! row describes one patient together with a single MRI scan image and one
//! annotation on that scan.

use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;

use crate::csv::{parse_records, write_records, Record};
use crate::error::{DatasetError, DatasetResult};

pub const DATASET_COLUMNS: [&str; 5] = ["name", "dob", "record", "scan_file", "annotation"];
pub const SCAN_FILE_COLUMN: &str = "scan_file";
pub const DEFAULT_START: u32 = 10;
pub const DEFAULT_COUNT: usize = 1000;

const FIRST_NAMES: &[&str] = &[
    "John", "Sarah", "Michael", "Emily", "Robert", "Jennifer", "David", "Lisa", "Christopher", "Amanda",
    "James", "Jessica", "Daniel", "Michelle", "William", "Ashley", "Matthew", "Kimberly", "Joshua", "Stephanie",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Chen", "Davis", "Wilson", "Brown", "Miller", "Martinez", "Taylor", "Anderson",
    "Thomas", "Jackson", "White", "Harris", "Martin", "Thompson", "Garcia", "Robinson", "Clark",
];

const CONDITIONS: &[&str] = &[
    "History of hypertension",
    "Diabetes mellitus type 2",
    "Post-operative evaluation",
    "Migraine headaches",
    "Cardiac arrhythmia",
    "Back pain with radiculopathy",
    "Sports injury",
    "Pregnancy related",
    "Chronic obstructive pulmonary disease",
    "Thyroid disorder",
    "Rheumatoid arthritis",
    "Gastroesophageal reflux",
    "Asthma",
    "Osteoarthritis",
    "Anxiety disorder",
    "Depression",
    "Hyperlipidemia",
    "Coronary artery disease",
    "Chronic kidney disease",
    "Liver cirrhosis",
];

const SYMPTOMS: &[&str] = &[
    "chest pain",
    "shortness of breath",
    "headache",
    "joint pain",
    "abdominal discomfort",
    "dizziness",
    "fatigue",
    "fever",
    "cough",
    "nausea",
    "vision changes",
    "weight loss",
    "palpitations",
    "swelling",
    "numbness",
    "weakness",
    "rash",
    "bleeding",
    "infection",
];

const FINDINGS: &[&str] = &[
    "Possible lesion detected",
    "No significant abnormalities",
    "Mild edema noted",
    "Normal morphology",
    "Small artifact observed",
    "Disc bulge detected",
    "Tear suspected",
    "Position normal",
    "Minor thickening",
    "Small nodule found",
    "Inflammation present",
    "Calcification noted",
    "Mass identified",
    "Fluid collection",
    "Enhancement pattern typical",
    "Degenerative changes",
    "Metastasis suspected",
];

const LOCATIONS: &[&str] = &[
    "lower left quadrant",
    "upper right quadrant",
    "anterior region",
    "posterior region",
    "medial aspect",
    "lateral aspect",
    "superior portion",
    "inferior portion",
    "central area",
    "peripheral zone",
];

/// One dataset row, kept as text the way it appears in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientRow {
    /// Line in the source file, 0 for generated rows
    pub line: usize,
    pub name: String,
    pub dob: String,
    pub record: String,
    pub scan_file: String,
    pub annotation: String,
}

impl PatientRow {
    fn fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.dob.as_str(),
            self.record.as_str(),
            self.scan_file.as_str(),
            self.annotation.as_str(),
        ]
    }
}

/// Scan image path for sequence number `n`
pub fn scan_file_name(n: u64) -> String {
    format!("mri_scans/Tr-no_{:04}.jpg", n)
}

/// Generate `count` rows, numbering scan files from `start`.
///
/// Dates of birth are uniform between 1940-01-01 and 2000-12-31 inclusive.
pub fn generate<R: Rng + ?Sized>(count: usize, start: u32, rng: &mut R) -> Vec<PatientRow> {
    let earliest = NaiveDate::from_ymd_opt(1940, 1, 1).unwrap_or_default();
    let latest = NaiveDate::from_ymd_opt(2000, 12, 31).unwrap_or_default();
    let span_days = (latest - earliest).num_days();

    (0..count)
        .map(|i| {
            let dob = earliest + Duration::days(rng.gen_range(0..=span_days));
            PatientRow {
                line: 0,
                name: format!("{} {}", pick(FIRST_NAMES, rng), pick(LAST_NAMES, rng)),
                dob: dob.format("%Y-%m-%d").to_string(),
                record: format!("{}. Complains of {}.", pick(CONDITIONS, rng), pick(SYMPTOMS, rng)),
                scan_file: scan_file_name(u64::from(start) + i as u64),
                annotation: format!("{} in {}.", pick(FINDINGS, rng), pick(LOCATIONS, rng)),
            }
        })
        .collect()
}

fn pick<'a, R: Rng + ?Sized>(pool: &[&'a str], rng: &mut R) -> &'a str {
    pool.choose(rng).copied().unwrap_or_default()
}

/// Serialize rows with the dataset header
pub fn to_csv(rows: &[PatientRow]) -> String {
    let records: Vec<Vec<&str>> = rows.iter().map(PatientRow::fields).collect();
    write_records(&DATASET_COLUMNS, &records)
}

/// Parse a dataset. Columns are located by header name, so extra or
/// reordered columns are accepted.
pub fn from_csv(input: &str) -> DatasetResult<Vec<PatientRow>> {
    let records = parse_records(input)?;
    let (header, rows) = records.split_first().ok_or(DatasetError::Empty)?;

    let index_of = |name: &str| {
        header
            .fields
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    };
    let name = index_of("name")?;
    let dob = index_of("dob")?;
    let record = index_of("record")?;
    let scan_file = index_of("scan_file")?;
    let annotation = index_of("annotation")?;

    rows.iter()
        .map(|row| {
            let field = |i: usize| {
                row.fields.get(i).cloned().ok_or_else(|| DatasetError::Malformed {
                    line: row.line,
                    message: format!("expected {} fields, found {}", header.fields.len(), row.fields.len()),
                })
            };
            Ok(PatientRow {
                line: row.line,
                name: field(name)?,
                dob: field(dob)?,
                record: field(record)?,
                scan_file: field(scan_file)?,
                annotation: field(annotation)?,
            })
        })
        .collect()
}

/// Rewrite the `scan_file` column sequentially from `start`, leaving every
/// other column as it was. Returns the new file contents and the number of
/// rows rewritten.
pub fn renumber(input: &str, start: u32) -> DatasetResult<(String, usize)> {
    let records = parse_records(input)?;
    let (header, rows) = records.split_first().ok_or(DatasetError::Empty)?;
    let column = header
        .fields
        .iter()
        .position(|h| h.trim() == SCAN_FILE_COLUMN)
        .ok_or_else(|| DatasetError::MissingColumn(SCAN_FILE_COLUMN.to_string()))?;

    let mut renumbered: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for (n, Record { line, fields }) in (u64::from(start)..).zip(rows) {
        let mut fields = fields.clone();
        let slot = fields.get_mut(column).ok_or_else(|| DatasetError::Malformed {
            line: *line,
            message: format!("no {} field", SCAN_FILE_COLUMN),
        })?;
        *slot = scan_file_name(n);
        renumbered.push(fields);
    }

    let header: Vec<&str> = header.fields.iter().map(String::as_str).collect();
    Ok((write_records(&header, &renumbered), renumbered.len()))
}

pub fn read_file(path: &Path) -> DatasetResult<String> {
    std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_file(path: &Path, contents: &str) -> DatasetResult<()> {
    std::fs::write(path, contents).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}
