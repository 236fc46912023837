//! In-memory storage backend implementation.
//!
//! This module provides [`MemoryBackend`], an in-memory implementation of
//! [`StorageBackend`] that models a browser-style storage area, including its
//! quota limits.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Ordered storage**: Keys are stored in a [`BTreeMap`] so inspection is deterministic
//! - **Quota enforcement**: Per-item size, total bytes, item count, and a rolling one-minute write
//!   ceiling, configured by [`StorageQuota`]
//!
//! # Example
//!
//! ```
//! use osmosis_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MemoryBackend::sync_area();
//!
//!     backend.set(b"greeting".to_vec(), b"hello".to_vec()).await.unwrap();
//!     let value = backend.get(b"greeting").await.unwrap();
//!
//!     assert_eq!(value.unwrap().as_ref(), b"hello");
//! }
//! ```
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - No replication: "sync" only describes the limits, not the behavior

use std::{
    collections::{BTreeMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::time::Instant;

use crate::{
    backend::StorageBackend,
    error::{StorageError, StorageResult},
    quota::{StorageQuota, item_size, validate_item, validate_totals},
};

/// Length of the rolling window the write ceiling applies to.
const WRITE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct AreaState {
    data: BTreeMap<Vec<u8>, Bytes>,
    bytes_in_use: usize,
    /// Instants of accepted writes inside the current window, oldest first.
    write_log: VecDeque<Instant>,
}

impl AreaState {
    /// Rejects the write if the rolling window is already full.
    fn check_write_ceiling(&mut self, quota: &StorageQuota, now: Instant) -> StorageResult<()> {
        let Some(limit) = quota.max_write_operations_per_minute() else {
            return Ok(());
        };

        while let Some(oldest) = self.write_log.front() {
            if now.duration_since(*oldest) >= WRITE_WINDOW {
                self.write_log.pop_front();
            } else {
                break;
            }
        }

        if self.write_log.len() >= limit as usize {
            let retry_after = self
                .write_log
                .front()
                .map_or(Duration::ZERO, |oldest| WRITE_WINDOW - now.duration_since(*oldest));
            return Err(StorageError::rate_limit_exceeded(retry_after));
        }
        Ok(())
    }

    fn record_write(&mut self, quota: &StorageQuota, now: Instant) {
        if quota.max_write_operations_per_minute().is_some() {
            self.write_log.push_back(now);
        }
    }
}

/// In-memory storage area using [`BTreeMap`].
///
/// # Cloning
///
/// `MemoryBackend` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying data and write accounting.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<AreaState>>,
    quota: StorageQuota,
}

impl MemoryBackend {
    /// Creates a new in-memory backend with no limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend enforcing the given quota.
    #[must_use]
    pub fn with_quota(quota: StorageQuota) -> Self {
        Self { state: Arc::default(), quota }
    }

    /// Creates a backend with the limits of the synchronized area.
    #[must_use]
    pub fn sync_area() -> Self {
        Self::with_quota(StorageQuota::sync())
    }

    /// Creates a backend with the limits of the local area.
    #[must_use]
    pub fn local_area() -> Self {
        Self::with_quota(StorageQuota::local())
    }

    /// Returns the quota this backend enforces.
    #[must_use]
    pub fn quota(&self) -> &StorageQuota {
        &self.quota
    }

    /// Returns the number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().data.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().data.is_empty()
    }

    /// Returns all stored keys in byte order.
    #[must_use]
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.state.read().data.keys().cloned().collect()
    }

    /// Returns `true` if `key` is stored.
    #[must_use]
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.state.read().data.contains_key(key)
    }

    /// Returns the accounted size of everything stored (keys plus values).
    #[must_use]
    pub fn bytes_in_use(&self) -> usize {
        self.state.read().bytes_in_use
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    #[tracing::instrument(skip_all, fields(key = %String::from_utf8_lossy(key)))]
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        let state = self.state.read();
        Ok(state.data.get(key).cloned())
    }

    #[tracing::instrument(skip_all, fields(key = %String::from_utf8_lossy(&key), len = value.len()))]
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        let now = Instant::now();
        let mut state = self.state.write();

        state.check_write_ceiling(&self.quota, now)?;
        validate_item(&key, &value, &self.quota)?;

        let previous = state.data.get(&key).map(|old| item_size(&key, old));
        let total = state.bytes_in_use - previous.unwrap_or(0) + item_size(&key, &value);
        let items = state.data.len() + usize::from(previous.is_none());
        validate_totals(total, items, &self.quota)?;

        state.data.insert(key, Bytes::from(value));
        state.bytes_in_use = total;
        state.record_write(&self.quota, now);
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(key = %String::from_utf8_lossy(key)))]
    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        let now = Instant::now();
        let mut state = self.state.write();

        state.check_write_ceiling(&self.quota, now)?;

        if let Some(old) = state.data.remove(key) {
            state.bytes_in_use -= item_size(key, &old);
        }
        state.record_write(&self.quota, now);
        Ok(())
    }
}
