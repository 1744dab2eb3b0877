//! Supabase Storage client over the S3-compatible endpoint.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::Client;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use crate::error::{StorageError, StorageResult};
use crate::location::BlobLocation;

/// Fetches stored blobs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download the whole object.
    async fn download(&self, location: &BlobLocation) -> StorageResult<Vec<u8>>;
}

/// Configuration for the storage client.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// S3 endpoint URL (`https://<ref>.supabase.co/storage/v1/s3`)
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Region of the project
    pub region: String,
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("SUPABASE_S3_ENDPOINT")
                .map_err(|_| StorageError::config_error("SUPABASE_S3_ENDPOINT not set"))?,
            access_key_id: std::env::var("SUPABASE_S3_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("SUPABASE_S3_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("SUPABASE_S3_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("SUPABASE_S3_SECRET_ACCESS_KEY not set"))?,
            region: std::env::var("SUPABASE_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        })
    }
}

/// Supabase Storage client.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
}

impl SupabaseStorage {
    /// Create a new client from configuration.
    pub fn new(config: StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "supabase",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(StorageConfig::from_env()?))
    }
}

#[async_trait]
impl BlobStore for SupabaseStorage {
    async fn download(&self, location: &BlobLocation) -> StorageResult<Vec<u8>> {
        debug!(bucket = %location.bucket, path = %location.path, "Downloading blob");

        let response = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.path)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    StorageError::not_found(location.to_string())
                } else {
                    StorageError::download_failed(service_error.to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?
            .into_bytes()
            .to_vec();

        info!(location = %location, size = bytes.len(), "Video blob fetched");
        Ok(bytes)
    }
}
