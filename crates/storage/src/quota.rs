//! Quota limits for storage areas.
//!
//! A [`StorageQuota`] describes what a storage area is willing to hold and
//! how fast it may be written. [`MemoryBackend`](crate::MemoryBackend)
//! enforces a quota on every write so the constrained sync area can be
//! modelled faithfully in tests.
//!
//! # Presets
//!
//! | Limit | [`sync`](StorageQuota::sync) | [`local`](StorageQuota::local) |
//! |-------|------|-------|
//! | `quota_bytes` | 102 400 | 10 485 760 |
//! | `quota_bytes_per_item` | 8 192 | unlimited |
//! | `max_items` | 512 | unlimited |
//! | `max_write_operations_per_minute` | 120 | unlimited |
//!
//! Item size is the key length plus the value length, in bytes.

use crate::{ConfigError, StorageError};

/// Total bytes the sync area can hold.
pub const SYNC_QUOTA_BYTES: usize = 102_400;

/// Bytes a single sync item (key + value) can hold.
pub const SYNC_QUOTA_BYTES_PER_ITEM: usize = 8_192;

/// Number of items the sync area can hold.
pub const SYNC_MAX_ITEMS: usize = 512;

/// Write operations (sets and deletes) the sync area accepts per rolling minute.
pub const SYNC_MAX_WRITE_OPERATIONS_PER_MINUTE: u32 = 120;

/// Total bytes the local area can hold.
pub const LOCAL_QUOTA_BYTES: usize = 10 * 1024 * 1024;

/// Limits enforced by a storage area.
///
/// `None` means the corresponding limit is not enforced.
///
/// # Example
///
/// ```
/// use osmosis_storage::StorageQuota;
///
/// let quota = StorageQuota::new(Some(4096), Some(512), Some(8), None).unwrap();
/// assert_eq!(quota.quota_bytes_per_item(), Some(512));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageQuota {
    quota_bytes: Option<usize>,
    quota_bytes_per_item: Option<usize>,
    max_items: Option<usize>,
    max_write_operations_per_minute: Option<u32>,
}

impl StorageQuota {
    /// Creates a quota with the given limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if any supplied limit is zero.
    pub fn new(
        quota_bytes: Option<usize>,
        quota_bytes_per_item: Option<usize>,
        max_items: Option<usize>,
        max_write_operations_per_minute: Option<u32>,
    ) -> Result<Self, ConfigError> {
        check_non_zero("quota_bytes", quota_bytes.map(|v| v as u64))?;
        check_non_zero("quota_bytes_per_item", quota_bytes_per_item.map(|v| v as u64))?;
        check_non_zero("max_items", max_items.map(|v| v as u64))?;
        check_non_zero(
            "max_write_operations_per_minute",
            max_write_operations_per_minute.map(u64::from),
        )?;
        Ok(Self { quota_bytes, quota_bytes_per_item, max_items, max_write_operations_per_minute })
    }

    /// No limits at all.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Limits of the cross-device synchronized area.
    #[must_use]
    pub fn sync() -> Self {
        Self {
            quota_bytes: Some(SYNC_QUOTA_BYTES),
            quota_bytes_per_item: Some(SYNC_QUOTA_BYTES_PER_ITEM),
            max_items: Some(SYNC_MAX_ITEMS),
            max_write_operations_per_minute: Some(SYNC_MAX_WRITE_OPERATIONS_PER_MINUTE),
        }
    }

    /// Limits of the device-local area.
    #[must_use]
    pub fn local() -> Self {
        Self { quota_bytes: Some(LOCAL_QUOTA_BYTES), ..Self::default() }
    }

    /// Returns the total byte quota.
    #[must_use]
    pub fn quota_bytes(&self) -> Option<usize> {
        self.quota_bytes
    }

    /// Returns the per-item byte quota.
    #[must_use]
    pub fn quota_bytes_per_item(&self) -> Option<usize> {
        self.quota_bytes_per_item
    }

    /// Returns the maximum number of items.
    #[must_use]
    pub fn max_items(&self) -> Option<usize> {
        self.max_items
    }

    /// Returns the write ceiling per rolling minute.
    #[must_use]
    pub fn max_write_operations_per_minute(&self) -> Option<u32> {
        self.max_write_operations_per_minute
    }
}

fn check_non_zero(field: &'static str, value: Option<u64>) -> Result<(), ConfigError> {
    if value == Some(0) {
        return Err(ConfigError::BelowMinimum { field, min: "1".into(), value: "0".into() });
    }
    Ok(())
}

/// Returns the accounted size of an item: key bytes plus value bytes.
#[must_use]
pub fn item_size(key: &[u8], value: &[u8]) -> usize {
    key.len() + value.len()
}

/// Validates a single item against the per-item limit.
pub fn validate_item(key: &[u8], value: &[u8], quota: &StorageQuota) -> Result<(), StorageError> {
    let size = item_size(key, value);
    match quota.quota_bytes_per_item {
        Some(limit) if size > limit => Err(StorageError::size_limit_exceeded("item", size, limit)),
        _ => Ok(()),
    }
}

/// Validates the area totals a write would produce.
///
/// `total_bytes` and `items` are the values *after* the write is applied.
pub fn validate_totals(
    total_bytes: usize,
    items: usize,
    quota: &StorageQuota,
) -> Result<(), StorageError> {
    if let Some(limit) = quota.quota_bytes
        && total_bytes > limit
    {
        return Err(StorageError::quota_exceeded(format!(
            "QUOTA_BYTES: {total_bytes} bytes would exceed the {limit} byte quota"
        )));
    }
    if let Some(limit) = quota.max_items
        && items > limit
    {
        return Err(StorageError::quota_exceeded(format!(
            "MAX_ITEMS: {items} items would exceed the {limit} item quota"
        )));
    }
    Ok(())
}
