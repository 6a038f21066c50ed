//! Restricted high-capacity vault.
//!
//! Stores full-resolution assets. The vault does not speak presigned URLs;
//! transfers are authorized with an HMAC-SHA256 signed header set over the
//! method, bucket, key, and expiry.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clipmart_core::config::VaultStoreConfig;
use clipmart_core::models::StorageKey;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use sha2::Sha256;

use crate::traits::{DestinationBackend, StorageError, StorageResult, TransferGrant};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "x-vault-signature";
const EXPIRES_HEADER: &str = "x-vault-expires";

// Keys are URL-safe by generation; encode anything else a caller slips in.
const KEY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Clone)]
pub struct RestrictedVaultStore {
    endpoint: String,
    bucket: String,
    signing_key: Vec<u8>,
    public_base_url: Option<String>,
    grant_expiry: Duration,
    client: reqwest::Client,
}

impl RestrictedVaultStore {
    pub fn new(config: &VaultStoreConfig, grant_expiry: Duration) -> StorageResult<Self> {
        if config.signing_key.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "Vault signing key must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            signing_key: config.signing_key.as_bytes().to_vec(),
            public_base_url: config.public_base_url.clone(),
            grant_expiry,
            client,
        })
    }

    fn object_url(&self, key: &StorageKey) -> String {
        let encoded = utf8_percent_encode(key.as_str(), KEY_ENCODE_SET);
        format!("{}/{}/{}", self.endpoint, self.bucket, encoded)
    }

    fn sign(&self, method: &str, key: &StorageKey, expires: i64) -> StorageResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        mac.update(format!("{}\n{}\n{}\n{}", method, self.bucket, key, expires).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn signed_headers(
        &self,
        method: &str,
        key: &StorageKey,
        content_type: Option<&str>,
    ) -> StorageResult<(HashMap<String, String>, DateTime<Utc>)> {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.grant_expiry)
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        let expires = expires_at.timestamp();

        let mut headers = HashMap::new();
        headers.insert(
            SIGNATURE_HEADER.to_string(),
            self.sign(method, key, expires)?,
        );
        headers.insert(EXPIRES_HEADER.to_string(), expires.to_string());
        if let Some(content_type) = content_type {
            headers.insert("content-type".to_string(), content_type.to_string());
        }

        Ok((headers, expires_at))
    }
}

#[async_trait]
impl DestinationBackend for RestrictedVaultStore {
    async fn grant_put(
        &self,
        key: &StorageKey,
        content_type: &str,
    ) -> StorageResult<TransferGrant> {
        let (required_headers, expires_at) = self.signed_headers("PUT", key, Some(content_type))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            expiry_secs = self.grant_expiry.as_secs(),
            "Vault transfer grant issued"
        );

        Ok(TransferGrant {
            transfer_url: self.object_url(key),
            required_headers,
            public_url: self.public_url(key),
            expires_at,
        })
    }

    async fn exists(&self, key: &StorageKey) -> StorageResult<bool> {
        let (headers, _) = self.signed_headers("HEAD", key, None)?;

        let mut request = self.client.head(self.object_url(key));
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(StorageError::BackendError(format!(
                "Vault HEAD returned {}",
                status
            ))),
        }
    }

    fn public_url(&self, key: &StorageKey) -> String {
        match self.public_base_url {
            Some(ref base) => {
                let encoded = utf8_percent_encode(key.as_str(), KEY_ENCODE_SET);
                format!("{}/{}", base.trim_end_matches('/'), encoded)
            }
            None => self.object_url(key),
        }
    }
}
