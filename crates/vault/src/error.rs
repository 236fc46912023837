//! Vault error types.
//!
//! The UI layer distinguishes three user-facing failure kinds, each with its
//! own variant:
//!
//! | Variant | Meaning | Typical remedy |
//! |---------|---------|----------------|
//! | [`VaultError::InvalidWord`] | Input rejected before storage | Fix the input |
//! | [`VaultError::BucketFull`] | Too many words hashed into one sync bucket | Switch to local storage |
//! | [`VaultError::QuotaExceeded`] | The storage area as a whole is full | Remove words or switch area |
//!
//! Everything else is a [`VaultError::Storage`] error propagated unchanged
//! from the backend. Malformed stored data is never an error: the codec
//! skips entries it cannot parse.

use osmosis_storage::{ConfigError, StorageError};
use thiserror::Error;

/// Result type alias for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors returned by vault providers and the vault service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VaultError {
    /// The word is empty or contains characters other than ASCII letters.
    #[error("Invalid word {word:?}: {reason}")]
    InvalidWord {
        /// The input as received.
        word: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Adding the word would push its bucket past the per-bucket byte ceiling.
    ///
    /// Signals hash-collision overload in the bucketed provider. Nothing was
    /// written.
    #[error("Sync storage bucket {key} full: {size} bytes exceeds {limit} byte ceiling")]
    BucketFull {
        /// Storage key of the overflowing bucket.
        key: String,
        /// Serialized size the bucket would have had.
        size: usize,
        /// Configured ceiling.
        limit: usize,
    },

    /// The storage area reported that its total quota is exhausted.
    #[error("Storage quota exceeded: {message}")]
    QuotaExceeded {
        /// Backend-provided description.
        message: String,
    },

    /// Any other storage failure, propagated unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Invalid vault configuration.
    #[error("Invalid vault configuration: {0}")]
    Config(#[from] ConfigError),
}

impl VaultError {
    /// Creates a new `InvalidWord` error.
    #[must_use]
    pub fn invalid_word(word: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidWord { word: word.into(), reason }
    }

    /// Maps a storage error from a write path, lifting quota exhaustion into
    /// its own variant.
    #[must_use]
    pub fn from_write(err: StorageError) -> Self {
        match err {
            StorageError::QuotaExceeded { message } => Self::QuotaExceeded { message },
            other => Self::Storage(other),
        }
    }
}
