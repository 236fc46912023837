//! Key-value storage area abstraction for Osmosis.
//!
//! This crate provides the [`StorageBackend`] trait the word vault is built
//! on, together with [`MemoryBackend`], an in-memory area that enforces the
//! same quota model as the browser's synchronized storage.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    VaultService                             │
//! │          (normalization, provider selection)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │     BucketedVaultProvider     │     FlatVaultProvider       │
//! │  (hash buckets, codec, pacing)│   (single JSON document)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   osmosis-storage                           │
//! │       StorageBackend trait · RateLimiter · StorageQuota     │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │       sync area              │        local area            │
//! │  (8 KiB/item, 100 KiB total, │      (no tight limits)       │
//! │   120 writes/minute)         │                              │
//! └──────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`]. Constrained areas report
//! per-item overflow as [`StorageError::SizeLimitExceeded`], a full area as
//! [`StorageError::QuotaExceeded`] and a saturated write window as
//! [`StorageError::RateLimitExceeded`].
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with instrumented backends and assertion
//!   macros. Enable this in `[dev-dependencies]` for integration tests.

#![deny(unsafe_code)]

pub mod backend;
pub mod error;
pub mod memory;
pub mod quota;
pub mod rate_limiter;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;

// Re-export primary types at crate root for convenience
pub use backend::StorageBackend;
pub use error::{BoxError, ConfigError, StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use quota::StorageQuota;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
