//! Discount catalog providers.
//!
//! The catalog lives in an external discount-management service. Providers
//! fetch a snapshot per request and must fail soft: any transport or decode
//! error degrades to the empty catalog so the pricing path never throws.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::rules::DiscountCatalog;

const FETCH_TIMEOUT_SECS: u64 = 5;

#[async_trait]
pub trait DiscountCatalogProvider: Send + Sync {
    /// Load the current catalog snapshot. Infallible by contract; failures
    /// degrade to [`DiscountCatalog::default`].
    async fn load(&self) -> DiscountCatalog;
}

/// HTTP-backed provider for the external discount service.
pub struct HttpCatalogProvider {
    client: Client,
    url: String,
}

impl HttpCatalogProvider {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client for discount catalog")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn fetch(&self) -> Result<DiscountCatalog> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Discount catalog request failed")?
            .error_for_status()
            .context("Discount catalog returned error status")?;

        response
            .json::<DiscountCatalog>()
            .await
            .context("Failed to decode discount catalog")
    }
}

#[async_trait]
impl DiscountCatalogProvider for HttpCatalogProvider {
    async fn load(&self) -> DiscountCatalog {
        match self.fetch().await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    url = %self.url,
                    "Discount catalog fetch failed, pricing continues without discounts"
                );
                DiscountCatalog::default()
            }
        }
    }
}

/// Fixed-snapshot provider for tests and catalog-less deployments.
#[derive(Default)]
pub struct StaticCatalogProvider {
    catalog: DiscountCatalog,
}

impl StaticCatalogProvider {
    pub fn new(catalog: DiscountCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl DiscountCatalogProvider for StaticCatalogProvider {
    async fn load(&self) -> DiscountCatalog {
        self.catalog.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_provider_parses_catalog() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/discounts")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"global":{"type":"percentage","percentOff":10},"creators":{"alice":{"type":"amount","amountOff":5}}}"#,
            )
            .create_async()
            .await;

        let provider = HttpCatalogProvider::new(format!("{}/discounts", server.url())).unwrap();
        let catalog = provider.load().await;

        mock.assert_async().await;
        assert!(catalog.global.is_some());
        assert_eq!(catalog.creator_rules("alice").len(), 1);
    }

    #[tokio::test]
    async fn test_http_provider_fails_soft_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/discounts")
            .with_status(500)
            .create_async()
            .await;

        let provider = HttpCatalogProvider::new(format!("{}/discounts", server.url())).unwrap();
        let catalog = provider.load().await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_http_provider_fails_soft_on_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/discounts")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let provider = HttpCatalogProvider::new(format!("{}/discounts", server.url())).unwrap();
        let catalog = provider.load().await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_http_provider_fails_soft_when_unreachable() {
        // Port 9 (discard) is almost certainly closed.
        let provider = HttpCatalogProvider::new("http://127.0.0.1:9/discounts").unwrap();
        let catalog = provider.load().await;
        assert!(catalog.is_empty());
    }
}
