use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Catalog item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Video,
    Image,
}

impl Default for ItemKind {
    fn default() -> Self {
        ItemKind::Video
    }
}

/// A published catalog record.
///
/// Created once by the publication writer; the pipeline never mutates it
/// afterwards. `full_key`, when present, is unique across all items and refers
/// to a key that completed a restricted-store transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedItem {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub creator_name: String,
    pub kind: ItemKind,
    pub preview_url: String,
    pub thumbnail_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_key: Option<String>,
    #[serde(default)]
    pub locked: bool,
    /// Only meaningful when `kind == Image` and `locked` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_password: Option<String>,
    #[serde(default)]
    pub tags: HashSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Publication input, before creator resolution and validation.
///
/// Preview/thumbnail URLs and the full-resolution key are filled in from the
/// upload outcome (or supplied directly by an already-uploaded caller).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to 0 when absent or non-numeric.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Decimal,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub full_key: Option<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub unlock_password: Option<String>,
    #[serde(default)]
    pub tags: HashSet<String>,
    #[serde(default)]
    pub duration_secs: Option<i64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Accept a number or a numeric string; anything else falls back to 0.
fn lenient_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_price(&value))
}

/// Price coercion shared by draft deserialization and request handling.
pub fn coerce_price(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .and_then(Decimal::from_f64_retain)
            .unwrap_or_default(),
        serde_json::Value::String(s) => s.trim().parse::<Decimal>().unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}
