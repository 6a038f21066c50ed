//! Storage key generation.
//!
//! Keys are minted client-side from creator, title, and a timestamp so two
//! publishes of the same title never collide, and must stay URL-safe for
//! direct use in transfer and public URLs.

use chrono::Utc;
use clipmart_core::models::StorageKey;

const MAX_SLUG_LEN: usize = 80;

/// Generate a fresh storage key for a publish attempt.
///
/// Format: `{creator-slug}/{title-slug}-{unix_millis}.{ext}`.
pub fn generate_storage_key(creator: &str, title: &str, extension: &str) -> StorageKey {
    storage_key_at(creator, title, extension, Utc::now().timestamp_millis())
}

fn storage_key_at(creator: &str, title: &str, extension: &str, timestamp_millis: i64) -> StorageKey {
    let creator = slugify(creator);
    let title = slugify(title);
    let ext = slugify(extension);

    let key = if ext.is_empty() {
        format!("{}/{}-{}", creator, title, timestamp_millis)
    } else {
        format!("{}/{}-{}.{}", creator, title, timestamp_millis, ext)
    };
    StorageKey::new(key)
}

/// Compose a key from a folder prefix and a client-supplied file name, as used
/// by the transfer authorization endpoint.
pub fn compose_key(folder: &str, file_name: &str) -> StorageKey {
    let folder = slugify(folder);
    let name = sanitize_file_name(file_name);
    if folder.is_empty() {
        StorageKey::new(name)
    } else {
        StorageKey::new(format!("{}/{}", folder, name))
    }
}

/// Lowercased, URL-safe slug: alphanumerics kept, runs of anything else
/// collapsed to single dashes.
fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_dash = true;
    for c in input.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug.truncate(MAX_SLUG_LEN);
    slug
}

fn sanitize_file_name(file_name: &str) -> String {
    let base = std::path::Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);
    if base.contains("..") {
        return "file".to_string();
    }
    let s: String = base
        .chars()
        .take(255)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim_matches(['_', '.']).is_empty() {
        "file".to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_format() {
        let key = storage_key_at("Alice B.", "Sunset Run! (final)", "mp4", 1700000000000);
        assert_eq!(key.as_str(), "alice-b/sunset-run-final-1700000000000.mp4");
    }

    #[test]
    fn test_storage_key_is_url_safe() {
        let key = storage_key_at("Ümläut Creator", "Clip #1 @ 50%", "MOV", 1);
        assert!(key
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/' || c == '.'));
    }

    #[test]
    fn test_distinct_timestamps_avoid_collision() {
        let a = storage_key_at("alice", "clip", "mp4", 1);
        let b = storage_key_at("alice", "clip", "mp4", 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_compose_key_strips_traversal() {
        let key = compose_key("previews", "../../etc/passwd");
        assert_eq!(key.as_str(), "previews/passwd");

        let key = compose_key("previews", "..hidden..");
        assert_eq!(key.as_str(), "previews/file");
    }

    #[test]
    fn test_compose_key_without_folder() {
        let key = compose_key("", "clip one.mp4");
        assert_eq!(key.as_str(), "clip_one.mp4");
    }
}
