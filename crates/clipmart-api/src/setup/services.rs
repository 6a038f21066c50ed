//! Service construction from configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clipmart_core::Config;
use clipmart_db::MemoryContentStore;
use clipmart_pricing::{DiscountCatalogProvider, HttpCatalogProvider, StaticCatalogProvider};
use clipmart_services::{
    NoopNotifier, PricingEnrichmentService, PublishNotifier, PublishService, WebhookNotifier,
};
use clipmart_storage::{
    DestinationBackend, GeneralAssetStore, RestrictedVaultStore, TransferAuthorizer,
};

use crate::state::AppState;

/// Build application state from configuration.
///
/// The content store is the in-memory implementation; production deployments
/// swap in the external content database behind the same traits.
pub fn build_state(config: Config) -> Result<Arc<AppState>> {
    let grant_expiry = Duration::from_secs(config.grant_expiry_secs);

    let general_backend: Option<Arc<dyn DestinationBackend>> = match config.general_store {
        Some(ref store_config) => Some(Arc::new(
            GeneralAssetStore::new(store_config, grant_expiry)
                .context("Failed to build general asset store")?,
        )),
        None => None,
    };
    let vault_backend: Option<Arc<dyn DestinationBackend>> = match config.vault_store {
        Some(ref store_config) => Some(Arc::new(
            RestrictedVaultStore::new(store_config, grant_expiry)
                .context("Failed to build restricted vault store")?,
        )),
        None => None,
    };

    let mut authorizer = TransferAuthorizer::new();
    if let Some(ref secret) = config.secrets.general {
        authorizer = authorizer.with_general(secret.clone(), general_backend);
    }
    if let Some(ref secret) = config.secrets.vault {
        authorizer = authorizer.with_vault(secret.clone(), vault_backend);
    }

    let catalog: Arc<dyn DiscountCatalogProvider> = match config.discount_catalog_url {
        Some(ref url) => Arc::new(
            HttpCatalogProvider::new(url.clone())
                .context("Failed to build discount catalog provider")?,
        ),
        None => Arc::new(StaticCatalogProvider::default()),
    };

    let notifier: Arc<dyn PublishNotifier> = match config.publish_webhook_url {
        Some(ref url) => Arc::new(
            WebhookNotifier::new(url.clone()).context("Failed to build publish notifier")?,
        ),
        None => Arc::new(NoopNotifier),
    };

    let store = Arc::new(MemoryContentStore::new());

    let publisher = Arc::new(PublishService::new(
        store.clone(),
        store.clone(),
        notifier,
        config.public_site_url.clone(),
    ));
    let enrichment = Arc::new(PricingEnrichmentService::new(catalog, store.clone()));

    Ok(Arc::new(AppState {
        config,
        authorizer: Arc::new(authorizer),
        publisher,
        enrichment,
        items: store,
    }))
}
