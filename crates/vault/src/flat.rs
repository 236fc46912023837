//! Single-document vault layout for the local storage area.
//!
//! The local area has no tight per-value limit, so the whole word set lives
//! under one key as a JSON object mapping word to creation time:
//!
//! ```json
//! {"apple":1735689600000,"banana":1735689660000}
//! ```
//!
//! Writes are not paced. One provider-wide mutex serializes every
//! read-modify-write.

use std::{collections::BTreeMap, fmt, sync::Arc};

use async_trait::async_trait;
use osmosis_storage::{StorageBackend, StorageError};
use tokio::sync::Mutex;

use crate::{
    clock::{Clock, SystemClock},
    config::VaultConfig,
    error::{VaultError, VaultResult},
    provider::{StorageStats, VaultProvider, WordEntry, WordMap},
    settings::ProviderKind,
};

type Document = BTreeMap<String, i64>;

/// Vault provider that stores every word in one JSON document.
pub struct FlatVaultProvider<B> {
    backend: Arc<B>,
    key: String,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl<B: StorageBackend> FlatVaultProvider<B> {
    /// Creates a provider over `backend` storing under the configured local key.
    pub fn new(backend: Arc<B>, config: &VaultConfig) -> Self {
        Self {
            backend,
            key: config.local_key().to_owned(),
            clock: Arc::new(SystemClock),
            write_lock: Mutex::new(()),
        }
    }

    /// Replaces the clock used to stamp new words.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the underlying backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Returns the key of the document.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the document. A missing key is an empty document; a value that
    /// is not a JSON object of integers is a serialization error.
    async fn read(&self) -> VaultResult<Document> {
        let Some(raw) = self.backend.get(self.key.as_bytes()).await? else {
            return Ok(Document::new());
        };
        serde_json::from_slice(&raw).map_err(|e| {
            VaultError::Storage(StorageError::serialization_with_source(
                format!("corrupt vault document at {}", self.key),
                e,
            ))
        })
    }

    async fn write(&self, document: &Document) -> VaultResult<()> {
        let json = serde_json::to_vec(document).map_err(|e| {
            VaultError::Storage(StorageError::serialization_with_source("vault document", e))
        })?;
        self.backend.set(self.key.clone().into_bytes(), json).await.map_err(VaultError::from_write)
    }
}

impl<B> fmt::Debug for FlatVaultProvider<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatVaultProvider")
            .field("key", &self.key)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<B: StorageBackend> VaultProvider for FlatVaultProvider<B> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    #[tracing::instrument(skip(self))]
    async fn get_all(&self) -> VaultResult<WordMap> {
        Ok(self
            .read()
            .await?
            .into_iter()
            .map(|(word, created_at)| (word.clone(), WordEntry { word, created_at }))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn add(&self, word: &str) -> VaultResult<()> {
        if word.is_empty() {
            return Err(VaultError::invalid_word(word, "word is empty"));
        }
        let _guard = self.write_lock.lock().await;

        let mut document = self.read().await?;
        if document.contains_key(word) {
            tracing::debug!("word already starred");
            return Ok(());
        }
        document.insert(word.to_owned(), self.clock.now_millis());
        self.write(&document).await
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, word: &str) -> VaultResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read().await?;
        if document.remove(word).is_none() {
            tracing::debug!("word not starred");
            return Ok(());
        }
        self.write(&document).await
    }

    #[tracing::instrument(skip(self))]
    async fn has(&self, word: &str) -> VaultResult<bool> {
        Ok(self.read().await?.contains_key(word))
    }

    #[tracing::instrument(skip(self))]
    async fn clear(&self) -> VaultResult<()> {
        let _guard = self.write_lock.lock().await;
        self.backend.delete(self.key.as_bytes()).await.map_err(VaultError::from_write)
    }

    #[tracing::instrument(skip(self))]
    async fn stats(&self) -> VaultResult<StorageStats> {
        let document = self.read().await?;
        let json = serde_json::to_string(&document).map_err(|e| {
            VaultError::Storage(StorageError::serialization_with_source("vault document", e))
        })?;
        Ok(StorageStats { bytes_used: json.len(), items_count: document.len(), chunk_count: 1 })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use osmosis_storage::{
        MemoryBackend,
        testutil::{CountingBackend, FailingBackend, InjectedFailure},
    };

    use super::*;
    use crate::testutil::ManualClock;

    const NOW: i64 = 1_735_689_600_000;

    fn provider<B: StorageBackend>(backend: B) -> FlatVaultProvider<B> {
        FlatVaultProvider::new(Arc::new(backend), &VaultConfig::default())
            .with_clock(Arc::new(ManualClock::new(NOW)))
    }

    async fn stored(backend: &MemoryBackend) -> Option<String> {
        backend
            .get(b"vault_local_data")
            .await
            .unwrap()
            .map(|b| String::from_utf8(b.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn stores_one_json_document() {
        let p = provider(MemoryBackend::new());
        p.add("banana").await.unwrap();
        p.add("apple").await.unwrap();

        assert_eq!(
            stored(p.backend()).await.as_deref(),
            Some(r#"{"apple":1735689600000,"banana":1735689600000}"#)
        );
        assert_eq!(p.backend().len(), 1);
    }

    #[tokio::test]
    async fn keeps_millisecond_precision() {
        let p = FlatVaultProvider::new(Arc::new(MemoryBackend::new()), &VaultConfig::default())
            .with_clock(Arc::new(ManualClock::new(NOW + 12_345)));
        p.add("apple").await.unwrap();

        assert_eq!(p.get_all().await.unwrap()["apple"].created_at, NOW + 12_345);
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let clock = Arc::new(ManualClock::new(NOW));
        let p = FlatVaultProvider::new(Arc::new(MemoryBackend::new()), &VaultConfig::default())
            .with_clock(clock.clone());

        p.add("cat").await.unwrap();
        clock.advance(Duration::from_secs(60));
        p.add("cat").await.unwrap();

        assert_eq!(p.get_all().await.unwrap()["cat"].created_at, NOW);
    }

    #[tokio::test]
    async fn remove_keeps_other_words() {
        let p = provider(MemoryBackend::new());
        p.add("apple").await.unwrap();
        p.add("banana").await.unwrap();

        p.remove("apple").await.unwrap();

        assert!(!p.has("apple").await.unwrap());
        assert!(p.has("banana").await.unwrap());
    }

    #[tokio::test]
    async fn remove_absent_word_writes_nothing() {
        let p = provider(CountingBackend::new(MemoryBackend::new()));
        p.remove("ghost").await.unwrap();
        assert_eq!(p.backend().counts().sets, 0);
    }

    #[tokio::test]
    async fn clear_deletes_the_document() {
        let p = provider(MemoryBackend::new());
        p.add("apple").await.unwrap();

        p.clear().await.unwrap();

        assert!(p.backend().is_empty());
        assert!(p.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_report_json_size_and_one_chunk() {
        let p = provider(MemoryBackend::new());
        assert_eq!(
            p.stats().await.unwrap(),
            StorageStats { bytes_used: 2, items_count: 0, chunk_count: 1 }
        );

        p.add("apple").await.unwrap();

        let expected = r#"{"apple":1735689600000}"#.len();
        assert_eq!(
            p.stats().await.unwrap(),
            StorageStats { bytes_used: expected, items_count: 1, chunk_count: 1 }
        );
    }

    #[tokio::test]
    async fn corrupt_document_is_a_serialization_error() {
        let backend = MemoryBackend::new();
        backend.set(b"vault_local_data".to_vec(), b"[1,2".to_vec()).await.unwrap();
        let p = provider(backend);

        let err = p.get_all().await.unwrap_err();

        assert!(
            matches!(err, VaultError::Storage(StorageError::Serialization { .. })),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn quota_failure_maps_to_quota_exceeded() {
        let p = provider(FailingBackend::new(MemoryBackend::new()));
        p.backend().fail_writes(InjectedFailure::QuotaExceeded);

        let err = p.add("apple").await.unwrap_err();

        assert!(matches!(err, VaultError::QuotaExceeded { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn custom_local_key() {
        let config = VaultConfig::builder().local_key("words").build().unwrap();
        let p = FlatVaultProvider::new(Arc::new(MemoryBackend::new()), &config);
        p.add("apple").await.unwrap();

        assert_eq!(p.key(), "words");
        assert!(p.backend().contains_key(b"words"));
    }
}
