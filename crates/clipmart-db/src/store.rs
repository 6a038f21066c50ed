//! Store abstraction traits
//!
//! All content-store backends must implement these traits. The pipeline works
//! against the traits only and never couples to a concrete database.

use async_trait::async_trait;
use clipmart_core::models::{Creator, PublishedItem};
use thiserror::Error;
use uuid::Uuid;

/// Store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The unique sparse index on `full_key` rejected the write.
    #[error("Duplicate full-resolution key: {0}")]
    DuplicateFullKey(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Creator lookup contract.
#[async_trait]
pub trait CreatorStore: Send + Sync {
    /// Find a creator by case-insensitive name match.
    async fn find_by_name_ci(&self, name: &str) -> StoreResult<Option<Creator>>;
}

/// Catalog item persistence contract.
///
/// `insert` must enforce the `full_key` uniqueness invariant atomically with
/// the write; callers treat [`StoreError::DuplicateFullKey`] as a conflict,
/// never as an overwrite.
#[async_trait]
pub trait CatalogItemStore: Send + Sync {
    async fn insert(&self, item: PublishedItem) -> StoreResult<PublishedItem>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<PublishedItem>>;

    /// All items, newest first.
    async fn list(&self) -> StoreResult<Vec<PublishedItem>>;
}
