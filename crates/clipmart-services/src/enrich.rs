//! Pricing enrichment for outward item representations.
//!
//! Every read path goes through the same shaping: one catalog snapshot per
//! request, pricing resolved per item, creator capability flags joined on.
//! Single-item reads delegate to the list path so the shaping is identical
//! either way.

use std::sync::Arc;

use clipmart_core::models::PublishedItem;
use clipmart_core::AppError;
use clipmart_db::{CreatorStore, StoreError};
use clipmart_pricing::{resolve, DiscountCatalogProvider, DiscountRule};
use rust_decimal::Decimal;
use serde::Serialize;

/// Outward-facing item representation with injected pricing and creator flags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    #[serde(flatten)]
    pub item: PublishedItem,
    pub base_price: Decimal,
    pub final_price: Decimal,
    pub discount: Option<DiscountRule>,
    pub premium: bool,
    pub pay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_url_handle: Option<String>,
}

pub struct PricingEnrichmentService {
    catalog: Arc<dyn DiscountCatalogProvider>,
    creators: Arc<dyn CreatorStore>,
}

impl PricingEnrichmentService {
    pub fn new(
        catalog: Arc<dyn DiscountCatalogProvider>,
        creators: Arc<dyn CreatorStore>,
    ) -> Self {
        Self { catalog, creators }
    }

    /// Shape a list of items against one catalog snapshot.
    #[tracing::instrument(skip_all, fields(item_count = items.len()))]
    pub async fn shape_many(
        &self,
        items: Vec<PublishedItem>,
    ) -> Result<Vec<ItemView>, AppError> {
        let catalog = self.catalog.load().await;

        let mut views = Vec::with_capacity(items.len());
        for item in items {
            let creator = self
                .creators
                .find_by_name_ci(&item.creator_name)
                .await
                .map_err(|e: StoreError| AppError::Storage(e.to_string()))?;

            let pricing = resolve(item.price, &item.creator_name, &item.tags, &catalog);

            let (premium, pay, creator_url_handle) = match creator {
                Some(creator) => (creator.premium, creator.pay, creator.url_handle),
                None => (false, false, None),
            };

            views.push(ItemView {
                base_price: pricing.base_price,
                final_price: pricing.final_price,
                discount: pricing.applied,
                premium,
                pay,
                creator_url_handle,
                item,
            });
        }

        Ok(views)
    }

    /// Shape a single item through the exact same path as lists.
    pub async fn shape_one(&self, item: PublishedItem) -> Result<ItemView, AppError> {
        self.shape_many(vec![item])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Shaping produced no view".to_string()))
    }
}
