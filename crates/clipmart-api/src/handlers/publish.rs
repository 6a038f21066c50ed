//! Publication endpoint.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use clipmart_core::models::item::coerce_price;
use clipmart_core::models::{ItemDraft, ItemKind};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Request to publish a catalog item from already-transferred assets
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishItemRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Thumbnail public URL
    pub thumbnail: Option<String>,
    /// Defaults to 0 when absent or non-numeric
    #[serde(default)]
    pub price: Option<serde_json::Value>,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Creator name must be between 1 and 100 characters"
    ))]
    pub creator_name: String,
    /// Preview public URL
    pub url: Option<String>,
    /// Restricted-store key of the full-resolution asset
    #[serde(default)]
    pub full_key: Option<String>,
    /// Item kind: "video" (default) or "image"
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub kind: Option<ItemKind>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub unlock_password: Option<String>,
    #[serde(default)]
    pub tags: HashSet<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Publish a catalog item
#[utoipa::path(
    post,
    path = "/api/v0/items",
    tag = "items",
    request_body = PublishItemRequest,
    responses(
        (status = 201, description = "Item published"),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Creator not found", body = ErrorResponse),
        (status = 409, description = "Duplicate full-resolution key", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(
        creator = %request.creator_name,
        operation = "publish_item"
    )
)]
pub async fn publish_item(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<PublishItemRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let price = request
        .price
        .as_ref()
        .map(coerce_price)
        .unwrap_or_default();

    let draft = ItemDraft {
        title: request.title,
        description: request.description,
        price,
        creator_name: request.creator_name,
        kind: request.kind.unwrap_or_default(),
        preview_url: request.url,
        thumbnail_url: request.thumbnail,
        full_key: request.full_key,
        locked: request.locked,
        unlock_password: request.unlock_password,
        tags: request.tags,
        duration_secs: request.duration,
        width: request.width,
        height: request.height,
    };

    let item = state.publisher.publish(draft).await?;
    Ok((StatusCode::CREATED, Json(item)))
}
