//! Publish notification fan-out.
//!
//! Delivery is at-most-once and best-effort: the publication writer spawns
//! the send and logs failures without rolling back the published item.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clipmart_core::models::PublishedItem;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

const DELIVERY_TIMEOUT_SECS: u64 = 10;

/// Public-facing fields of a freshly published item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishNotification {
    pub item_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub creator_name: String,
    pub tags: Vec<String>,
    /// Tracked outbound link to the item page.
    pub link: String,
    pub published_at: DateTime<Utc>,
}

impl PublishNotification {
    pub fn for_item(item: &PublishedItem, public_site_url: &str) -> Self {
        let mut tags: Vec<String> = item.tags.iter().cloned().collect();
        tags.sort();

        Self {
            item_id: item.id,
            title: item.title.clone(),
            description: item.description.clone(),
            price: item.price,
            creator_name: item.creator_name.clone(),
            tags,
            link: format!(
                "{}/items/{}?ref=publish-notify",
                public_site_url.trim_end_matches('/'),
                item.id
            ),
            published_at: item.created_at,
        }
    }
}

#[async_trait]
pub trait PublishNotifier: Send + Sync {
    async fn notify_published(&self, notification: &PublishNotification) -> Result<()>;
}

/// Webhook-style notifier posting the notification as JSON.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DELIVERY_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client for publish notifications")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PublishNotifier for WebhookNotifier {
    async fn notify_published(&self, notification: &PublishNotification) -> Result<()> {
        self.client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .context("Publish notification request failed")?
            .error_for_status()
            .context("Publish notification endpoint returned error status")?;

        tracing::debug!(
            item_id = %notification.item_id,
            "Publish notification delivered"
        );
        Ok(())
    }
}

/// Sink for deployments without a notification endpoint.
#[derive(Default)]
pub struct NoopNotifier;

#[async_trait]
impl PublishNotifier for NoopNotifier {
    async fn notify_published(&self, _notification: &PublishNotification) -> Result<()> {
        Ok(())
    }
}
