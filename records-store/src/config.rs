use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Connection settings for the hosted backend and its storage bucket
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://<ref>.supabase.co`
    pub url: String,
    /// Service key, sent as both `apikey` and bearer token
    pub service_key: String,
    /// Bucket holding scan images
    pub bucket: String,
}

impl BackendConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> StoreResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> StoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = var("SUPABASE_URL");
        let service_key = var("SUPABASE_KEY");

        match (url, service_key) {
            (Some(url), Some(service_key)) => Ok(Self {
                url: url.trim_end_matches('/').to_string(),
                service_key,
                bucket: var("SUPABASE_BUCKET").unwrap_or_else(|| "mri_scans".to_string()),
            }),
            (url, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push("SUPABASE_URL");
                }
                if key.is_none() {
                    missing.push("SUPABASE_KEY");
                }
                Err(StoreError::Config(format!(
                    "Missing required environment variables: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}
