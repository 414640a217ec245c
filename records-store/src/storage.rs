//! Object storage for scan images (Supabase Storage)

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::{StoreError, StoreResult};

/// Bucket holding uploaded objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `data` under `path` and return the object's public URL
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> StoreResult<String>;

    /// Public URL of an object, whether or not it exists
    fn public_url(&self, path: &str) -> String;
}

pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(config: &BackendConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: format!("{}/storage/v1", config.url.trim_end_matches('/')),
            bucket: config.bucket.clone(),
            service_key: config.service_key.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> StoreResult<String> {
        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, path);
        debug!(bucket = %self.bucket, path = path, bytes = data.len(), "Uploading object");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Storage(format!(
                "upload of {} failed with {}: {}",
                path, status, body
            )));
        }

        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, path)
    }
}

/// Object store kept in memory, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, path: &str, data: Vec<u8>, _content_type: &str) -> StoreResult<String> {
        let mut objects = self.objects.write();
        if objects.contains_key(path) {
            return Err(StoreError::Storage(format!("The resource already exists: {}", path)));
        }
        objects.insert(path.to_string(), data);
        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://public/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BackendConfig {
        BackendConfig {
            url: "https://example.supabase.co".to_string(),
            service_key: "service-key".to_string(),
            bucket: "mri_scans".to_string(),
        }
    }

    #[test]
    fn public_url_points_at_public_bucket_path() {
        let storage = SupabaseStorage::new(&config()).unwrap();
        assert_eq!(
            storage.public_url("p1_Tr-no_0010.jpg"),
            "https://example.supabase.co/storage/v1/object/public/mri_scans/p1_Tr-no_0010.jpg"
        );
    }

    #[tokio::test]
    async fn in_memory_store_rejects_duplicate_paths() {
        let store = InMemoryObjectStore::new();
        store.upload("a.jpg", vec![1, 2], "image/jpeg").await.unwrap();
        assert!(store.upload("a.jpg", vec![3], "image/jpeg").await.is_err());
        assert_eq!(store.get("a.jpg"), Some(vec![1, 2]));
    }
}
