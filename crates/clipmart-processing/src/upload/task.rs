//! Types for the upload orchestrator.

use std::collections::HashMap;

use bytes::Bytes;
use clipmart_core::config::DestinationClass;
use clipmart_core::models::StorageKey;
use clipmart_core::AppError;
use thiserror::Error;

pub const TASK_THUMBNAIL: &str = "thumbnail";
pub const TASK_PREVIEW: &str = "preview";
pub const TASK_FULL: &str = "full";

/// One named transfer: a payload bound for a key in a destination class.
///
/// Required tasks gate publication; optional tasks are tolerated absent but,
/// once submitted, still participate in the all-or-nothing completion policy.
#[derive(Debug, Clone)]
pub struct TransferTask {
    pub name: String,
    pub data: Bytes,
    pub destination: DestinationClass,
    pub key: StorageKey,
    pub content_type: String,
    pub required: bool,
}

impl TransferTask {
    pub fn required(
        name: impl Into<String>,
        data: Bytes,
        destination: DestinationClass,
        key: StorageKey,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            data,
            destination,
            key,
            content_type: content_type.into(),
            required: true,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        data: Bytes,
        destination: DestinationClass,
        key: StorageKey,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, data, destination, key, content_type)
        }
    }
}

/// A finished transfer: where the bytes landed and how to reach them.
#[derive(Debug, Clone)]
pub struct CompletedTransfer {
    pub key: StorageKey,
    pub public_url: String,
}

/// Map of task name to completed transfer, produced only when every
/// submitted task finished.
#[derive(Debug, Clone, Default)]
pub struct UploadOutcome {
    pub completed: HashMap<String, CompletedTransfer>,
}

impl UploadOutcome {
    pub fn public_url(&self, task_name: &str) -> Option<&str> {
        self.completed
            .get(task_name)
            .map(|transfer| transfer.public_url.as_str())
    }

    pub fn key(&self, task_name: &str) -> Option<&StorageKey> {
        self.completed.get(task_name).map(|transfer| &transfer.key)
    }
}

/// Fractional per-task progress, 0 to 100.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub task: String,
    pub percent: f64,
}

/// A transfer that did not complete, with the error that stopped it.
#[derive(Debug)]
pub struct FailedTask {
    pub name: String,
    pub error: AppError,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload cancelled")]
    Cancelled,

    #[error("Transfer task(s) failed: {}", .failed.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", "))]
    TasksFailed { failed: Vec<FailedTask> },
}

impl UploadError {
    /// Names of the failed tasks, in submission order.
    pub fn failed_task_names(&self) -> Vec<&str> {
        match self {
            UploadError::Cancelled => Vec::new(),
            UploadError::TasksFailed { failed } => {
                failed.iter().map(|f| f.name.as_str()).collect()
            }
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::Upstream(err.to_string())
    }
}
