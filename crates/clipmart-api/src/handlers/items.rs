//! Catalog read endpoints.
//!
//! Both reads run through the pricing enrichment service, so single and list
//! responses carry identical shaping.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use clipmart_core::AppError;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// List all catalog items with pricing applied
#[utoipa::path(
    get,
    path = "/api/v0/items",
    tag = "items",
    responses(
        (status = 200, description = "Enriched item list"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_items"))]
pub async fn list_items(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let items = state
        .items
        .list()
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let views = state.enrichment.shape_many(items).await?;
    Ok(Json(views))
}

/// Fetch one catalog item with pricing applied
#[utoipa::path(
    get,
    path = "/api/v0/items/{id}",
    tag = "items",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Enriched item"),
        (status = 404, description = "Item not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_item"))]
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let item = state
        .items
        .get(id)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Item not found: {}", id)))?;

    let view = state.enrichment.shape_one(item).await?;
    Ok(Json(view))
}
