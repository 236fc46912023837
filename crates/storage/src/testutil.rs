//! Shared test utilities for storage backend testing.
//!
//! This module provides instrumented backend wrappers and assertion macros.
//! It is feature-gated behind `testutil` to prevent leaking into production
//! builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! osmosis-storage = { path = "../storage", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use osmosis_storage::testutil::{
//!     CountingBackend, DelayedBackend, FailingBackend, InjectedFailure,
//! };
//! ```

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::{
    StorageBackend,
    error::{StorageError, StorageResult},
};

/// Number of calls a [`CountingBackend`] has seen, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounts {
    /// Calls to `get`.
    pub gets: usize,
    /// Calls to `set`.
    pub sets: usize,
    /// Calls to `delete`.
    pub deletes: usize,
}

/// A backend wrapper that counts every call and records which keys were read.
///
/// Used to verify access patterns, e.g. that a point lookup touches exactly
/// one key.
#[derive(Debug)]
pub struct CountingBackend<B> {
    inner: B,
    gets: AtomicUsize,
    sets: AtomicUsize,
    deletes: AtomicUsize,
    read_keys: Mutex<Vec<Vec<u8>>>,
}

impl<B: StorageBackend> CountingBackend<B> {
    /// Wraps `inner`.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            read_keys: Mutex::new(Vec::new()),
        }
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Returns the call counts so far.
    pub fn counts(&self) -> OperationCounts {
        OperationCounts {
            gets: self.gets.load(Ordering::SeqCst),
            sets: self.sets.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }

    /// Returns the keys passed to `get`, in call order.
    pub fn read_keys(&self) -> Vec<Vec<u8>> {
        self.read_keys.lock().clone()
    }

    /// Resets all counters and the read log.
    pub fn reset(&self) {
        self.gets.store(0, Ordering::SeqCst);
        self.sets.store(0, Ordering::SeqCst);
        self.deletes.store(0, Ordering::SeqCst);
        self.read_keys.lock().clear();
    }
}

#[async_trait]
impl<B: StorageBackend> StorageBackend for CountingBackend<B> {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.read_keys.lock().push(key.to_vec());
        self.inner.get(key).await
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }
}

/// Failure injected by a [`FailingBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Writes fail as if the area's total quota were exhausted.
    QuotaExceeded,
    /// Writes fail as if the area were unreachable.
    Connection,
    /// Writes time out.
    Timeout,
}

impl InjectedFailure {
    fn to_error(self) -> StorageError {
        match self {
            Self::QuotaExceeded => {
                StorageError::quota_exceeded("QUOTA_BYTES quota exceeded (injected)")
            },
            Self::Connection => StorageError::connection("storage area unavailable (injected)"),
            Self::Timeout => StorageError::timeout(),
        }
    }
}

/// A backend wrapper whose writes can be made to fail on demand.
///
/// Reads always pass through. While a failure is armed, `set` and `delete`
/// return the injected error without reaching the inner backend.
#[derive(Debug)]
pub struct FailingBackend<B> {
    inner: B,
    failure: Mutex<Option<InjectedFailure>>,
}

impl<B: StorageBackend> FailingBackend<B> {
    /// Wraps `inner` with no failure armed.
    pub fn new(inner: B) -> Self {
        Self { inner, failure: Mutex::new(None) }
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Makes every subsequent write fail with `failure`.
    pub fn fail_writes(&self, failure: InjectedFailure) {
        *self.failure.lock() = Some(failure);
    }

    /// Disarms the injected failure.
    pub fn heal(&self) {
        *self.failure.lock() = None;
    }

    fn armed(&self) -> StorageResult<()> {
        match *self.failure.lock() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<B: StorageBackend> StorageBackend for FailingBackend<B> {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        self.armed()?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.armed()?;
        self.inner.delete(key).await
    }
}

/// A backend wrapper that adds fixed latency to every read.
///
/// Widens the window between a read and the write that follows it, so
/// read-modify-write interleavings become deterministic under paused time.
#[derive(Debug)]
pub struct DelayedBackend<B> {
    inner: B,
    read_delay: Duration,
}

impl<B: StorageBackend> DelayedBackend<B> {
    /// Wraps `inner`, delaying each `get` by `read_delay`.
    pub fn new(inner: B, read_delay: Duration) -> Self {
        Self { inner, read_delay }
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: StorageBackend> StorageBackend for DelayedBackend<B> {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        tokio::time::sleep(self.read_delay).await;
        self.inner.get(key).await
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.inner.delete(key).await
    }
}

/// Assert that a [`StorageResult`] is an error of the given [`StorageError`]
/// variant.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use osmosis_storage::assert_storage_error;
/// use osmosis_storage::{StorageError, StorageResult};
///
/// let result: StorageResult<()> = Err(StorageError::quota_exceeded("full"));
/// assert_storage_error!(result, QuotaExceeded);
/// ```
#[macro_export]
macro_rules! assert_storage_error {
    ($result:expr, $variant:ident) => {
        match $result {
            Err($crate::error::StorageError::$variant { .. }) => {},
            other => panic!(
                "expected StorageError::{}, got: {:?}",
                stringify!($variant),
                other
            ),
        }
    };
}
