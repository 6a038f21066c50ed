//! Publication writer.
//!
//! Resolves the creator, validates the draft, persists exactly one catalog
//! item, and fans out the publish notification. Partial upload results never
//! reach this service; the orchestrator reports full success first.

use std::sync::Arc;

use chrono::Utc;
use clipmart_core::models::{ItemDraft, ItemKind, PublishedItem};
use clipmart_core::AppError;
use clipmart_db::{CatalogItemStore, CreatorStore, StoreError};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::notify::{PublishNotification, PublishNotifier};

pub struct PublishService {
    creators: Arc<dyn CreatorStore>,
    items: Arc<dyn CatalogItemStore>,
    notifier: Arc<dyn PublishNotifier>,
    public_site_url: String,
}

impl PublishService {
    pub fn new(
        creators: Arc<dyn CreatorStore>,
        items: Arc<dyn CatalogItemStore>,
        notifier: Arc<dyn PublishNotifier>,
        public_site_url: impl Into<String>,
    ) -> Self {
        Self {
            creators,
            items,
            notifier,
            public_site_url: public_site_url.into(),
        }
    }

    /// Persist one catalog item from a validated draft.
    ///
    /// Idempotent on storage-key uniqueness: a duplicate `full_key` is a
    /// conflict, never an overwrite.
    #[tracing::instrument(skip(self, draft), fields(title = %draft.title, creator = %draft.creator_name))]
    pub async fn publish(&self, draft: ItemDraft) -> Result<PublishedItem, AppError> {
        if draft.creator_name.trim().is_empty() {
            return Err(AppError::Validation("Creator name is required".to_string()));
        }

        let creator = self
            .creators
            .find_by_name_ci(&draft.creator_name)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| AppError::CreatorNotFound(draft.creator_name.clone()))?;

        if draft.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        let preview_url = draft
            .preview_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Preview URL is required".to_string()))?;
        let thumbnail_url = draft
            .thumbnail_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Thumbnail URL is required".to_string()))?;

        if draft.price < Decimal::ZERO {
            return Err(AppError::Validation(
                "Price must be zero or positive".to_string(),
            ));
        }

        // Unlock passwords only make sense for locked images.
        let unlock_password = if draft.kind == ItemKind::Image && draft.locked {
            draft.unlock_password
        } else {
            None
        };

        let item = PublishedItem {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            price: draft.price,
            creator_name: creator.name.clone(),
            kind: draft.kind,
            preview_url,
            thumbnail_url,
            full_key: draft.full_key,
            locked: draft.locked,
            unlock_password,
            tags: draft.tags,
            duration_secs: draft.duration_secs,
            width: draft.width,
            height: draft.height,
            created_at: Utc::now(),
        };

        let item = self.items.insert(item).await.map_err(map_store_error)?;

        tracing::info!(
            item_id = %item.id,
            creator = %item.creator_name,
            "Catalog item published"
        );

        // Fire-and-forget: delivery failure is logged, never rolled back.
        let notifier = self.notifier.clone();
        let notification = PublishNotification::for_item(&item, &self.public_site_url);
        tokio::spawn(async move {
            if let Err(e) = notifier.notify_published(&notification).await {
                tracing::warn!(
                    error = %e,
                    item_id = %notification.item_id,
                    "Failed to deliver publish notification"
                );
            }
        });

        Ok(item)
    }
}

fn map_store_error(err: StoreError) -> AppError {
    match err {
        StoreError::DuplicateFullKey(key) => AppError::Conflict(format!(
            "An item already references full-resolution key {}",
            key
        )),
        StoreError::Backend(msg) => AppError::Storage(msg),
    }
}
