//! Transfer authorizer.
//!
//! Fronts both destination classes: verifies the shared upload secret,
//! rejects unconfigured destinations, probes the general asset store for key
//! conflicts, and delegates grant issuance to the class backend.

use std::sync::Arc;

use clipmart_core::config::DestinationClass;
use clipmart_core::models::StorageKey;
use clipmart_core::AppError;
use subtle::ConstantTimeEq;

use crate::traits::{DestinationBackend, StorageError, TransferGrant};

struct ClassRegistration {
    shared_secret: String,
    backend: Option<Arc<dyn DestinationBackend>>,
}

#[derive(Default)]
pub struct TransferAuthorizer {
    general: Option<ClassRegistration>,
    vault: Option<ClassRegistration>,
}

impl TransferAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_general(
        mut self,
        shared_secret: impl Into<String>,
        backend: Option<Arc<dyn DestinationBackend>>,
    ) -> Self {
        self.general = Some(ClassRegistration {
            shared_secret: shared_secret.into(),
            backend,
        });
        self
    }

    pub fn with_vault(
        mut self,
        shared_secret: impl Into<String>,
        backend: Option<Arc<dyn DestinationBackend>>,
    ) -> Self {
        self.vault = Some(ClassRegistration {
            shared_secret: shared_secret.into(),
            backend,
        });
        self
    }

    /// Authorize one direct transfer to `destination` at `key`.
    #[tracing::instrument(skip(self, shared_secret), fields(destination = %destination, key = %key))]
    pub async fn authorize(
        &self,
        destination: DestinationClass,
        key: &StorageKey,
        content_type: &str,
        shared_secret: &str,
    ) -> Result<TransferGrant, AppError> {
        let registration = match destination {
            DestinationClass::GeneralAsset => self.general.as_ref(),
            DestinationClass::RestrictedVault => self.vault.as_ref(),
        }
        .ok_or_else(|| {
            AppError::Misconfigured(format!("Destination {} is not configured", destination))
        })?;

        if !secrets_match(&registration.shared_secret, shared_secret) {
            tracing::debug!(destination = %destination, "Shared secret mismatch");
            return Err(AppError::Unauthorized(
                "Shared upload secret does not match".to_string(),
            ));
        }

        let backend = registration.backend.as_ref().ok_or_else(|| {
            AppError::Misconfigured(format!(
                "Destination {} has no backend credentials configured",
                destination
            ))
        })?;

        // The general store rejects overwrites; the vault relies on key
        // generation for uniqueness.
        if destination == DestinationClass::GeneralAsset
            && backend.exists(key).await.map_err(map_storage_error)?
        {
            return Err(AppError::Conflict(format!(
                "An object already exists at key {}",
                key
            )));
        }

        let grant = backend
            .grant_put(key, content_type)
            .await
            .map_err(map_storage_error)?;

        tracing::info!(
            destination = %destination,
            key = %key,
            "Transfer authorized"
        );

        Ok(grant)
    }
}

fn secrets_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

fn map_storage_error(err: StorageError) -> AppError {
    match err {
        StorageError::ConfigError(msg) => AppError::Misconfigured(msg),
        StorageError::GrantFailed(msg) | StorageError::BackendError(msg) => {
            AppError::Upstream(msg)
        }
    }
}
