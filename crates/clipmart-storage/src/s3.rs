//! General asset store (S3-compatible).
//!
//! Holds previews and thumbnails. Transfers are authorized with presigned
//! PUT URLs so clients write directly to the bucket.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use clipmart_core::config::GeneralStoreConfig;
use clipmart_core::models::StorageKey;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, Result as ObjectResult};

use crate::traits::{DestinationBackend, StorageError, StorageResult, TransferGrant};

/// S3-compatible general asset store
#[derive(Clone)]
pub struct GeneralAssetStore {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    public_base_url: Option<String>,
    grant_expiry: Duration,
}

impl GeneralAssetStore {
    /// Create a new GeneralAssetStore instance
    ///
    /// Credentials come from the environment (standard AWS variables);
    /// `endpoint` enables S3-compatible providers (e.g., "http://localhost:9000"
    /// for MinIO, "https://nyc3.digitaloceanspaces.com" for DigitalOcean Spaces).
    pub fn new(config: &GeneralStoreConfig, grant_expiry: Duration) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(config.region.clone())
            .with_bucket_name(config.bucket.clone());

        if let Some(ref endpoint) = config.endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(GeneralAssetStore {
            store,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint_url: config.endpoint.clone(),
            public_base_url: config.public_base_url.clone(),
            grant_expiry,
        })
    }

    /// Generate public URL for an object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses the endpoint URL if provided
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref base) = self.public_base_url {
            return format!("{}/{}", base.trim_end_matches('/'), key);
        }
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            // Path-style for compatibility: {endpoint}/{bucket}/{key}
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }
}

#[async_trait]
impl DestinationBackend for GeneralAssetStore {
    async fn grant_put(
        &self,
        key: &StorageKey,
        content_type: &str,
    ) -> StorageResult<TransferGrant> {
        let location = Path::from(key.as_str());
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::PUT, &location, self.grant_expiry)
            .await;

        let transfer_url = url_result
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "Presigned PUT URL generation failed"
                );
                StorageError::GrantFailed(e.to_string())
            })?
            .to_string();

        let mut required_headers = HashMap::new();
        required_headers.insert("content-type".to_string(), content_type.to_string());

        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.grant_expiry)
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            expiry_secs = self.grant_expiry.as_secs(),
            "Presigned PUT URL granted"
        );

        Ok(TransferGrant {
            transfer_url,
            required_headers,
            public_url: self.generate_url(key.as_str()),
            expires_at,
        })
    }

    async fn exists(&self, key: &StorageKey) -> StorageResult<bool> {
        let location = Path::from(key.as_str());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn public_url(&self, key: &StorageKey) -> String {
        self.generate_url(key.as_str())
    }
}
