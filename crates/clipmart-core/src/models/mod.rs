//! Domain models shared across the publishing pipeline and read path.

pub mod creator;
pub mod item;
pub mod media;

pub use creator::Creator;
pub use item::{ItemDraft, ItemKind, PublishedItem};
pub use media::{MediaFile, StorageKey};
