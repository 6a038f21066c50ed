//! Transfer authorization endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use clipmart_core::config::DestinationClass;
use clipmart_core::AppError;
use clipmart_storage::keys::compose_key;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Request for a short-lived direct-transfer authorization
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeUploadRequest {
    /// Original file name
    #[validate(length(
        min = 1,
        max = 255,
        message = "File name must be between 1 and 255 characters"
    ))]
    pub file_name: String,
    /// Content type (MIME type)
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// Key prefix within the destination
    #[serde(default)]
    pub folder: String,
    /// Shared upload secret for the destination class
    #[validate(length(min = 1, message = "Shared secret is required"))]
    pub shared_secret: String,
    /// Destination class: "asset" (default) or "vault"
    #[serde(default = "default_destination")]
    pub destination: String,
}

fn default_destination() -> String {
    "asset".to_string()
}

/// Response containing the transfer authorization
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeUploadResponse {
    /// URL to PUT the raw bytes to
    pub transfer_url: String,
    /// Headers the backend requires on the PUT
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub required_headers: HashMap<String, String>,
    /// Eventual publicly-resolvable URL
    pub public_url: String,
    /// Storage key the object will live at
    pub key: String,
    /// Authorization expiry
    pub expires_at: DateTime<Utc>,
}

/// Authorize one direct binary transfer
#[utoipa::path(
    post,
    path = "/api/v0/uploads/authorize",
    tag = "uploads",
    request_body = AuthorizeUploadRequest,
    responses(
        (status = 200, description = "Transfer authorized", body = AuthorizeUploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Shared secret mismatch", body = ErrorResponse),
        (status = 409, description = "Key already exists", body = ErrorResponse),
        (status = 500, description = "Destination misconfigured", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(
        destination = %request.destination,
        file_name = %request.file_name,
        operation = "authorize_upload"
    )
)]
pub async fn authorize_upload(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<AuthorizeUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let destination: DestinationClass = request
        .destination
        .parse()
        .map_err(|e: String| AppError::Validation(e))?;

    let key = compose_key(&request.folder, &request.file_name);

    let grant = state
        .authorizer
        .authorize(
            destination,
            &key,
            &request.content_type,
            &request.shared_secret,
        )
        .await?;

    Ok(Json(AuthorizeUploadResponse {
        transfer_url: grant.transfer_url,
        required_headers: grant.required_headers,
        public_url: grant.public_url,
        key: key.into_inner(),
        expires_at: grant.expires_at,
    }))
}
