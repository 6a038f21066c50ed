use serde::{Deserialize, Serialize};

/// A creator account as seen by the publishing pipeline and read path.
///
/// `name` is unique across all creators; lookups are case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub name: String,
    /// Social/contact URL shown on the creator page.
    pub contact_url: String,
    pub premium: bool,
    /// Gates whether paid full-resolution access is offered.
    pub pay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Creator {
    pub fn new(name: impl Into<String>, contact_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact_url: contact_url.into(),
            premium: false,
            pay: false,
            url_handle: None,
            photo_url: None,
        }
    }

    /// Normalized form used for catalog keys and case-insensitive matching.
    pub fn normalized_name(&self) -> String {
        normalize_creator_name(&self.name)
    }
}

/// Lowercased, trimmed creator name as used to key per-creator discount rules.
pub fn normalize_creator_name(name: &str) -> String {
    name.trim().to_lowercase()
}
