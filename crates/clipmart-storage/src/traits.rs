//! Destination backend abstraction
//!
//! A destination backend hands out short-lived transfer authorizations; the
//! actual binary transfer is performed by the caller against the returned
//! URL, so backends stay opaque authorization + transfer contracts.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clipmart_core::models::StorageKey;
use serde::Serialize;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Grant failed: {0}")]
    GrantFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Short-lived authorization for one direct binary transfer.
///
/// Carries everything the caller needs to PUT the raw bytes without further
/// round-trips: the transfer URL, any headers the backend requires, and the
/// eventual publicly-resolvable URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferGrant {
    pub transfer_url: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub required_headers: HashMap<String, String>,
    pub public_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Destination backend contract.
///
/// Implemented by the S3-compatible general asset store and the restricted
/// vault; the authorizer works against this trait only.
#[async_trait]
pub trait DestinationBackend: Send + Sync {
    /// Obtain a transfer authorization for a PUT of `content_type` bytes at `key`.
    async fn grant_put(&self, key: &StorageKey, content_type: &str)
        -> StorageResult<TransferGrant>;

    /// Check whether an object already exists at `key`.
    async fn exists(&self, key: &StorageKey) -> StorageResult<bool>;

    /// Publicly-resolvable URL for an object at `key`.
    fn public_url(&self, key: &StorageKey) -> String;
}
