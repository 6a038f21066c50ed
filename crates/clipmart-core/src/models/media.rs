use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// An in-memory media payload moving through the preprocessing and upload
/// stages. Never persisted; only referenced by storage key after a
/// successful transfer.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub data: Bytes,
    pub content_type: String,
    pub file_name: String,
}

impl MediaFile {
    pub fn new(data: Bytes, content_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lowercased file extension, empty when the name has none.
    pub fn extension(&self) -> String {
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => String::new(),
        }
    }
}

/// Opaque, URL-safe identifier for an object within a destination class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StorageKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for StorageKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}
