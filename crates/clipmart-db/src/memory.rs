//! In-memory content store.
//!
//! Backs the store traits for tests and local wiring. The `full_key`
//! uniqueness check runs under the same write lock as the insert so the
//! invariant holds under concurrent publication attempts.

use std::collections::HashMap;

use async_trait::async_trait;
use clipmart_core::models::creator::normalize_creator_name;
use clipmart_core::models::{Creator, PublishedItem};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{CatalogItemStore, CreatorStore, StoreError, StoreResult};

#[derive(Default)]
pub struct MemoryContentStore {
    creators: RwLock<HashMap<String, Creator>>,
    items: RwLock<Vec<PublishedItem>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a creator; keyed by normalized name.
    pub async fn add_creator(&self, creator: Creator) {
        let mut creators = self.creators.write().await;
        creators.insert(creator.normalized_name(), creator);
    }

    pub async fn item_count(&self) -> usize {
        self.items.read().await.len()
    }
}

#[async_trait]
impl CreatorStore for MemoryContentStore {
    async fn find_by_name_ci(&self, name: &str) -> StoreResult<Option<Creator>> {
        let creators = self.creators.read().await;
        Ok(creators.get(&normalize_creator_name(name)).cloned())
    }
}

#[async_trait]
impl CatalogItemStore for MemoryContentStore {
    async fn insert(&self, item: PublishedItem) -> StoreResult<PublishedItem> {
        let mut items = self.items.write().await;

        if let Some(ref full_key) = item.full_key {
            if items
                .iter()
                .any(|existing| existing.full_key.as_deref() == Some(full_key.as_str()))
            {
                return Err(StoreError::DuplicateFullKey(full_key.clone()));
            }
        }

        items.push(item.clone());
        Ok(item)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<PublishedItem>> {
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<PublishedItem>> {
        let items = self.items.read().await;
        let mut all: Vec<PublishedItem> = items.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clipmart_core::models::ItemKind;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    fn sample_item(full_key: Option<&str>) -> PublishedItem {
        PublishedItem {
            id: Uuid::new_v4(),
            title: "Sunset run".to_string(),
            description: String::new(),
            price: Decimal::from(10),
            creator_name: "alice".to_string(),
            kind: ItemKind::Video,
            preview_url: "https://cdn.example/preview.mp4".to_string(),
            thumbnail_url: "https://cdn.example/thumb.jpg".to_string(),
            full_key: full_key.map(String::from),
            locked: false,
            unlock_password: None,
            tags: HashSet::new(),
            duration_secs: Some(66),
            width: None,
            height: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_creator_lookup_is_case_insensitive() {
        let store = MemoryContentStore::new();
        store
            .add_creator(Creator::new("Alice", "https://social.example/alice"))
            .await;

        let found = store.find_by_name_ci("aLiCe").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().name, "Alice");

        assert!(store.find_by_name_ci("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_full_key_rejected() {
        let store = MemoryContentStore::new();
        store.insert(sample_item(Some("full/clip-1.mp4"))).await.unwrap();

        let err = store
            .insert(sample_item(Some("full/clip-1.mp4")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateFullKey(_)));

        // Items without a full key never collide.
        store.insert(sample_item(None)).await.unwrap();
        store.insert(sample_item(None)).await.unwrap();
        assert_eq!(store.item_count().await, 3);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryContentStore::new();
        let mut first = sample_item(None);
        first.created_at = Utc::now() - chrono::Duration::hours(1);
        let second = sample_item(None);

        let first_id = first.id;
        let second_id = second.id;
        store.insert(first).await.unwrap();
        store.insert(second).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed[0].id, second_id);
        assert_eq!(listed[1].id, first_id);
    }
}
