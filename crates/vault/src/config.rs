//! Configuration for the vault providers and service.
//!
//! [`VaultConfig`] names the storage keys the vault owns and the limits the
//! bucketed layout enforces. Every constructor validates, including
//! deserialization, so a `VaultConfig` value is always usable.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use osmosis_vault::VaultConfig;
//!
//! let config = VaultConfig::builder()
//!     .bucket_prefix("starred_")
//!     .min_write_interval(Duration::from_secs(1))
//!     .build()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use osmosis_storage::{ConfigError, rate_limiter::DEFAULT_MIN_INTERVAL};
use serde::{Deserialize, Serialize};

/// Default prefix of bucket keys in the sync area.
pub const DEFAULT_BUCKET_PREFIX: &str = "vault_";

/// Default ceiling on a single serialized bucket.
///
/// Leaves headroom under the sync area's 8 KiB per-item limit for the key and
/// the area's own accounting.
pub const DEFAULT_MAX_BYTES_PER_BUCKET: usize = 7000;

/// Default key of the local-area document.
pub const DEFAULT_LOCAL_KEY: &str = "vault_local_data";

/// Default key of the user settings document.
pub const DEFAULT_SETTINGS_KEY: &str = "extension_settings";

/// Vault configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVaultConfig")]
pub struct VaultConfig {
    bucket_prefix: String,
    max_bytes_per_bucket: usize,
    #[serde(with = "humantime_serde")]
    min_write_interval: Duration,
    local_key: String,
    settings_key: String,
}

#[bon::bon]
impl VaultConfig {
    /// Creates a new configuration.
    ///
    /// # Optional Fields
    ///
    /// * `bucket_prefix` - Prefix of bucket keys (default: `"vault_"`).
    /// * `max_bytes_per_bucket` - Serialized bucket ceiling (default: 7000).
    /// * `min_write_interval` - Spacing between sync writes (default: 500ms).
    /// * `local_key` - Key of the local-area document (default: `"vault_local_data"`).
    /// * `settings_key` - Key of the settings document (default: `"extension_settings"`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Empty`] for an empty key or prefix and
    /// [`ConfigError::BelowMinimum`] for a zero ceiling or interval.
    #[builder]
    pub fn new(
        #[builder(into, default = String::from(DEFAULT_BUCKET_PREFIX))] bucket_prefix: String,
        #[builder(default = DEFAULT_MAX_BYTES_PER_BUCKET)] max_bytes_per_bucket: usize,
        #[builder(default = DEFAULT_MIN_INTERVAL)] min_write_interval: Duration,
        #[builder(into, default = String::from(DEFAULT_LOCAL_KEY))] local_key: String,
        #[builder(into, default = String::from(DEFAULT_SETTINGS_KEY))] settings_key: String,
    ) -> Result<Self, ConfigError> {
        if bucket_prefix.is_empty() {
            return Err(ConfigError::Empty { field: "bucket_prefix" });
        }
        if max_bytes_per_bucket == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_bytes_per_bucket",
                min: "1".into(),
                value: "0".into(),
            });
        }
        if min_write_interval.is_zero() {
            return Err(ConfigError::BelowMinimum {
                field: "min_write_interval",
                min: "1ns".into(),
                value: "0ns".into(),
            });
        }
        if local_key.is_empty() {
            return Err(ConfigError::Empty { field: "local_key" });
        }
        if settings_key.is_empty() {
            return Err(ConfigError::Empty { field: "settings_key" });
        }

        Ok(Self { bucket_prefix, max_bytes_per_bucket, min_write_interval, local_key, settings_key })
    }

    /// Returns the bucket key prefix.
    #[must_use]
    pub fn bucket_prefix(&self) -> &str {
        &self.bucket_prefix
    }

    /// Returns the serialized bucket ceiling in bytes.
    #[must_use]
    pub fn max_bytes_per_bucket(&self) -> usize {
        self.max_bytes_per_bucket
    }

    /// Returns the minimum spacing between sync-area writes.
    #[must_use]
    pub fn min_write_interval(&self) -> Duration {
        self.min_write_interval
    }

    /// Returns the key of the local-area document.
    #[must_use]
    pub fn local_key(&self) -> &str {
        &self.local_key
    }

    /// Returns the key of the settings document.
    #[must_use]
    pub fn settings_key(&self) -> &str {
        &self.settings_key
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            bucket_prefix: DEFAULT_BUCKET_PREFIX.to_owned(),
            max_bytes_per_bucket: DEFAULT_MAX_BYTES_PER_BUCKET,
            min_write_interval: DEFAULT_MIN_INTERVAL,
            local_key: DEFAULT_LOCAL_KEY.to_owned(),
            settings_key: DEFAULT_SETTINGS_KEY.to_owned(),
        }
    }
}

/// Wire form of [`VaultConfig`], validated on conversion.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVaultConfig {
    #[serde(default = "default_bucket_prefix")]
    bucket_prefix: String,
    #[serde(default = "default_max_bytes_per_bucket")]
    max_bytes_per_bucket: usize,
    #[serde(with = "humantime_serde", default = "default_min_write_interval")]
    min_write_interval: Duration,
    #[serde(default = "default_local_key")]
    local_key: String,
    #[serde(default = "default_settings_key")]
    settings_key: String,
}

fn default_bucket_prefix() -> String {
    DEFAULT_BUCKET_PREFIX.to_owned()
}

fn default_max_bytes_per_bucket() -> usize {
    DEFAULT_MAX_BYTES_PER_BUCKET
}

fn default_min_write_interval() -> Duration {
    DEFAULT_MIN_INTERVAL
}

fn default_local_key() -> String {
    DEFAULT_LOCAL_KEY.to_owned()
}

fn default_settings_key() -> String {
    DEFAULT_SETTINGS_KEY.to_owned()
}

impl TryFrom<RawVaultConfig> for VaultConfig {
    type Error = ConfigError;

    fn try_from(raw: RawVaultConfig) -> Result<Self, Self::Error> {
        Self::builder()
            .bucket_prefix(raw.bucket_prefix)
            .max_bytes_per_bucket(raw.max_bytes_per_bucket)
            .min_write_interval(raw.min_write_interval)
            .local_key(raw.local_key)
            .settings_key(raw.settings_key)
            .build()
    }
}
