//! The provider interface shared by every vault storage layout.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::VaultResult, settings::ProviderKind};

/// A starred word and the time it was starred.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    /// The normalized word.
    pub word: String,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
}

impl WordEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(word: impl Into<String>, created_at: i64) -> Self {
        Self { word: word.into(), created_at }
    }
}

/// Every stored word keyed by itself.
pub type WordMap = BTreeMap<String, WordEntry>;

/// Storage footprint of a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Bytes of stored values.
    pub bytes_used: usize,
    /// Number of stored words.
    pub items_count: usize,
    /// Number of storage keys the layout spreads words over.
    pub chunk_count: usize,
}

/// A storage layout for the starred-word set.
///
/// Implementations receive words already normalized by the caller. All
/// failures propagate unchanged; providers never retry.
#[async_trait]
pub trait VaultProvider: Send + Sync {
    /// Which storage area this provider writes to.
    fn kind(&self) -> ProviderKind;

    /// Reads every stored word.
    async fn get_all(&self) -> VaultResult<WordMap>;

    /// Stars `word`. Adding a word that is already present changes nothing.
    async fn add(&self, word: &str) -> VaultResult<()>;

    /// Unstars `word`. Removing an absent word changes nothing.
    async fn remove(&self, word: &str) -> VaultResult<()>;

    /// Returns whether `word` is starred.
    async fn has(&self, word: &str) -> VaultResult<bool>;

    /// Removes every stored word.
    async fn clear(&self) -> VaultResult<()>;

    /// Reports the provider's storage footprint.
    async fn stats(&self) -> VaultResult<StorageStats>;
}
