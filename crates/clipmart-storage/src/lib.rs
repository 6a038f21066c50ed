//! Destination-class storage for the publishing pipeline.
//!
//! Two independently-failing destinations: the general asset store
//! (S3-compatible, presigned PUT transfers) for previews and thumbnails, and
//! the restricted high-capacity vault (HMAC signed-header transfers) for
//! full-resolution assets. The [`TransferAuthorizer`] fronts both with the
//! shared-secret check and the conflict probe.

pub mod authorizer;
pub mod keys;
pub mod s3;
pub mod traits;
pub mod vault;

pub use authorizer::TransferAuthorizer;
pub use keys::{compose_key, generate_storage_key};
pub use s3::GeneralAssetStore;
pub use traits::{DestinationBackend, StorageError, StorageResult, TransferGrant};
pub use vault::RestrictedVaultStore;
