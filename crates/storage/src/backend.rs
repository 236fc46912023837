//! Storage backend trait definition.
//!
//! This module defines the [`StorageBackend`] trait, the abstraction over a
//! durable key-value storage area. Two kinds of area exist in practice:
//!
//! - a **sync** area, replicated across the user's devices but capped in
//!   total bytes, bytes per item, item count, and writes per minute;
//! - a **local** area with no meaningful limits.
//!
//! # Design Philosophy
//!
//! The trait is deliberately minimal:
//! - **Keys and values are bytes**: No assumptions about serialization format
//! - **Async by default**: Every call is a round trip to the host
//! - **No transactions**: Callers needing read-modify-write must serialize
//!   access themselves
//!
//! Domain logic (bucketing, encoding) lives in the repository layer built on
//! top of this trait, not in the storage backends.
//!
//! See [`MemoryBackend`](crate::MemoryBackend) for a reference implementation.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageResult;

/// Abstract storage backend for key-value operations.
///
/// Backends are expected to be thread-safe (`Send + Sync`) and support
/// concurrent operations.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`get`](StorageBackend::get) | Retrieve a single value by key |
/// | [`set`](StorageBackend::set) | Store a key-value pair |
/// | [`delete`](StorageBackend::delete) | Remove a key |
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use osmosis_storage::{MemoryBackend, StorageBackend};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let backend = MemoryBackend::new();
///
/// backend.set(b"key".to_vec(), b"value".to_vec()).await.unwrap();
/// let value = backend.get(b"key").await.unwrap();
/// assert_eq!(value, Some(Bytes::from("value")));
/// # });
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))` if the key exists
    /// - `Ok(None)` if the key doesn't exist
    /// - `Err(...)` on storage errors
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Stores a key-value pair.
    ///
    /// If the key already exists, its value is overwritten.
    ///
    /// # Errors
    ///
    /// Constrained areas may reject the write with
    /// [`SizeLimitExceeded`](crate::StorageError::SizeLimitExceeded),
    /// [`QuotaExceeded`](crate::StorageError::QuotaExceeded) or
    /// [`RateLimitExceeded`](crate::StorageError::RateLimitExceeded). A
    /// rejected write leaves the stored value untouched.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()>;

    /// Deletes a key.
    ///
    /// If the key doesn't exist, this is a no-op (returns `Ok(())`).
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete(&self, key: &[u8]) -> StorageResult<()>;
}

