//! Publication and read-path services.
//!
//! The publication writer persists catalog items and fans out the publish
//! notification; the pricing enrichment service shapes every outward item
//! representation; the publish pipeline ties preprocessing, upload
//! orchestration, and persistence together.

pub mod enrich;
pub mod notify;
pub mod pipeline;
pub mod publisher;

pub use enrich::{ItemView, PricingEnrichmentService};
pub use notify::{NoopNotifier, PublishNotification, PublishNotifier, WebhookNotifier};
pub use pipeline::{PublishPipeline, PublishPipelineError, PublishRequest, PublishStage};
pub use publisher::PublishService;
