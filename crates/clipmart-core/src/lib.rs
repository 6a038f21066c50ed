//! Clipmart Core Library
//!
//! This crate provides the domain models, error types, and configuration
//! shared across all Clipmart components.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, DestinationClass, GeneralStoreConfig, VaultStoreConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Creator, ItemDraft, ItemKind, MediaFile, PublishedItem, StorageKey};
