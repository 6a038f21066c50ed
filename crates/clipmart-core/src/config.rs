//! Configuration module
//!
//! Environment-driven configuration for the publishing pipeline and the API:
//! destination-class storage backends, shared upload secrets, external media
//! tooling paths, and read-path service endpoints.

use std::env;

// Common constants
const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_GRANT_EXPIRY_SECS: u64 = 15 * 60;
/// Files above this size bypass metadata scrubbing entirely.
const DEFAULT_SCRUB_MAX_BYTES: u64 = 1_500_000_000;

/// Which storage destination a transfer targets.
///
/// `GeneralAsset` holds previews and thumbnails; `RestrictedVault` is the
/// high-capacity store for full-resolution assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationClass {
    GeneralAsset,
    RestrictedVault,
}

impl DestinationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationClass::GeneralAsset => "asset",
            DestinationClass::RestrictedVault => "vault",
        }
    }
}

impl std::fmt::Display for DestinationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DestinationClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asset" | "general" => Ok(DestinationClass::GeneralAsset),
            "vault" | "restricted" => Ok(DestinationClass::RestrictedVault),
            other => Err(format!("Unknown destination class: {}", other)),
        }
    }
}

/// S3-compatible backend settings for the general asset store.
#[derive(Clone, Debug)]
pub struct GeneralStoreConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub endpoint: Option<String>,
    /// Overrides the derived public URL base when the bucket sits behind a CDN.
    pub public_base_url: Option<String>,
}

/// Restricted high-capacity vault settings (signed-header transfer contract).
#[derive(Clone, Debug)]
pub struct VaultStoreConfig {
    pub endpoint: String,
    pub bucket: String,
    pub signing_key: String,
    pub public_base_url: Option<String>,
}

/// Per-destination-class authorization settings. The shared secret gates
/// authorization even when the backend itself is absent.
#[derive(Clone, Debug, Default)]
pub struct DestinationSecrets {
    pub general: Option<String>,
    pub vault: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// Public site base, used for outbound links in publish notifications.
    pub public_site_url: String,
    pub secrets: DestinationSecrets,
    pub general_store: Option<GeneralStoreConfig>,
    pub vault_store: Option<VaultStoreConfig>,
    pub grant_expiry_secs: u64,
    /// Discount catalog endpoint; absent means pricing always sees an empty catalog.
    pub discount_catalog_url: Option<String>,
    pub publish_webhook_url: Option<String>,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub scrub_max_bytes: u64,
}

impl Config {
    /// Build configuration from environment variables (`CLIPMART_` prefix).
    pub fn from_env() -> Result<Self, String> {
        let general_store = match env::var("CLIPMART_ASSET_S3_BUCKET") {
            Ok(bucket) if !bucket.trim().is_empty() => Some(GeneralStoreConfig {
                bucket,
                region: env_or("CLIPMART_ASSET_S3_REGION", "us-east-1"),
                endpoint: env_opt("CLIPMART_ASSET_S3_ENDPOINT"),
                public_base_url: env_opt("CLIPMART_ASSET_PUBLIC_BASE_URL"),
            }),
            _ => None,
        };

        let vault_store = match (
            env_opt("CLIPMART_VAULT_ENDPOINT"),
            env_opt("CLIPMART_VAULT_SIGNING_KEY"),
        ) {
            (Some(endpoint), Some(signing_key)) => Some(VaultStoreConfig {
                endpoint,
                bucket: env_or("CLIPMART_VAULT_BUCKET", "full"),
                signing_key,
                public_base_url: env_opt("CLIPMART_VAULT_PUBLIC_BASE_URL"),
            }),
            _ => None,
        };

        Ok(Config {
            server_port: parse_env("CLIPMART_SERVER_PORT", DEFAULT_SERVER_PORT)?,
            cors_origins: parse_list(&env_or("CLIPMART_CORS_ORIGINS", "*")),
            environment: env_or("ENVIRONMENT", "development"),
            public_site_url: env_or("CLIPMART_PUBLIC_SITE_URL", "http://localhost:3000"),
            secrets: DestinationSecrets {
                general: env_opt("CLIPMART_ASSET_SECRET"),
                vault: env_opt("CLIPMART_VAULT_SECRET"),
            },
            general_store,
            vault_store,
            grant_expiry_secs: parse_env("CLIPMART_GRANT_EXPIRY_SECS", DEFAULT_GRANT_EXPIRY_SECS)?,
            discount_catalog_url: env_opt("CLIPMART_DISCOUNTS_URL"),
            publish_webhook_url: env_opt("CLIPMART_PUBLISH_WEBHOOK_URL"),
            ffmpeg_path: env_or("CLIPMART_FFMPEG_PATH", "ffmpeg"),
            ffprobe_path: env_or("CLIPMART_FFPROBE_PATH", "ffprobe"),
            scrub_max_bytes: parse_env("CLIPMART_SCRUB_MAX_BYTES", DEFAULT_SCRUB_MAX_BYTES)?,
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env_opt(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("Invalid value for {}: {}", key, raw)),
        None => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_class_parse() {
        assert_eq!(
            "asset".parse::<DestinationClass>().unwrap(),
            DestinationClass::GeneralAsset
        );
        assert_eq!(
            "VAULT".parse::<DestinationClass>().unwrap(),
            DestinationClass::RestrictedVault
        );
        assert!("tape".parse::<DestinationClass>().is_err());
    }

    #[test]
    fn test_parse_list_trims_and_drops_empties() {
        let origins = parse_list("https://a.example, https://b.example,,");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_parse_env_default_used_when_unset() {
        let port: u16 = parse_env("CLIPMART_TEST_UNSET_PORT", 9000).unwrap();
        assert_eq!(port, 9000);
    }
}
