//! PostgREST (Supabase) records backend
//!
//! Filters are expressed as query parameters (`name=ilike.*steven*`,
//! `patient_id=eq.<id>`); inserts are JSON posts with
//! `Prefer: return=representation` so the stored rows come back.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::RecordsBackend;
use crate::config::BackendConfig;
use crate::error::{StoreError, StoreResult};
use crate::models::{Annotation, NewAnnotation, NewPatient, NewScan, Patient, Scan};

const PATIENTS: &str = "patients";
const SCANS: &str = "scans";
const ANNOTATIONS: &str = "annotations";

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Records backend talking to `<url>/rest/v1`
#[derive(Clone)]
pub struct PostgrestBackend {
    client: reqwest::Client,
    rest_url: String,
    service_key: String,
}

impl PostgrestBackend {
    pub fn new(config: &BackendConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &BackendConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            service_key: config.service_key.clone(),
        }
    }

    fn table(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        debug!(table = table, filters = filters.len(), "PostgREST select");
        let response = self
            .table(reqwest::Method::GET, table)
            .query(&[("select", "*")])
            .query(filters)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> StoreResult<Vec<T>> {
        debug!(table = table, "PostgREST insert");
        let response = self
            .table(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> StoreResult<Vec<T>> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<PostgrestErrorBody>(&body) {
                Ok(err) => {
                    let mut message = err.message;
                    if let Some(code) = err.code {
                        message = format!("{} (code {})", message, code);
                    }
                    if let Some(details) = err.details {
                        message = format!("{}: {}", message, details);
                    }
                    message
                }
                Err(_) => format!("{} {}", status, body),
            };
            return Err(StoreError::Backend(message));
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn single<T>(rows: Vec<T>, table: &str) -> StoreResult<T> {
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("insert into {} returned no rows", table)))
    }
}

/// `ilike` filter value matching `fragment` anywhere in the column.
///
/// PostgREST turns `*` into `%`; literal `%`, `_` and `\` in the fragment are
/// escaped so they match themselves, and `*` is dropped.
pub fn ilike_contains(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    for c in fragment.chars() {
        match c {
            '*' => {}
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            other => escaped.push(other),
        }
    }
    format!("ilike.*{}*", escaped)
}

#[async_trait]
impl RecordsBackend for PostgrestBackend {
    async fn find_patients(&self, fragment: &str) -> StoreResult<Vec<Patient>> {
        self.select(
            PATIENTS,
            &[("name", ilike_contains(fragment)), ("order", "id.asc".to_string())],
        )
        .await
    }

    async fn scans_for_patient(
        &self,
        patient_id: &str,
        scan_type: Option<String>,
    ) -> StoreResult<Vec<Scan>> {
        let mut filters = vec![
            ("patient_id", format!("eq.{}", patient_id)),
            ("order", "scan_date.desc,id.asc".to_string()),
        ];
        if let Some(scan_type) = scan_type {
            filters.push(("scan_type", ilike_contains(&scan_type)));
        }
        self.select(SCANS, &filters).await
    }

    async fn annotations_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Annotation>> {
        self.select(
            ANNOTATIONS,
            &[
                ("patient_id", format!("eq.{}", patient_id)),
                ("order", "created_at.asc,id.asc".to_string()),
            ],
        )
        .await
    }

    async fn insert_annotation(&self, annotation: NewAnnotation) -> StoreResult<Vec<Annotation>> {
        self.insert(ANNOTATIONS, &annotation).await
    }

    async fn insert_patient(&self, patient: NewPatient) -> StoreResult<Patient> {
        let rows = self.insert(PATIENTS, &patient).await?;
        Self::single(rows, PATIENTS)
    }

    async fn insert_scan(&self, scan: NewScan) -> StoreResult<Scan> {
        let rows = self.insert(SCANS, &scan).await?;
        Self::single(rows, SCANS)
    }
}
