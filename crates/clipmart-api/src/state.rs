//! Application state shared across handlers.

use std::sync::Arc;

use clipmart_core::Config;
use clipmart_db::CatalogItemStore;
use clipmart_services::{PricingEnrichmentService, PublishService};
use clipmart_storage::TransferAuthorizer;

pub struct AppState {
    pub config: Config,
    pub authorizer: Arc<TransferAuthorizer>,
    pub publisher: Arc<PublishService>,
    pub enrichment: Arc<PricingEnrichmentService>,
    pub items: Arc<dyn CatalogItemStore>,
}
