//! Hash-bucketed vault layout for the synchronized storage area.
//!
//! The sync area caps each value at a few kilobytes, so the word set is
//! spread across [`BUCKET_COUNT`] keys. A word's bucket is its
//! [`hash_string`] modulo the bucket count; the hash is the index and no
//! directory is stored. Each bucket holds its words in the compact
//! [`codec`](crate::codec) form.
//!
//! ```text
//!                 hash_string(word) % 16
//!  "apple" ──────────────────────────────► vault_7  = "apple:bao0|camel:bao2"
//!  "cat"   ──────────────────────────────► vault_13 = "cat:bb01"
//! ```
//!
//! # Writes
//!
//! Every `add` and `remove` first waits on the provider's [`RateLimiter`], so
//! all writes leave in one paced queue, then holds the bucket's mutex for the
//! whole read-modify-write. Two concurrent writes to different words in the
//! same bucket therefore never overwrite each other. Lock order is always
//! limiter, then bucket.
//!
//! The limiter paces when writes start, not when they reach the backend. A
//! writer queued behind a slow read of its bucket keeps its permit while it
//! waits for the lock, so under same-bucket contention two backend writes
//! can land closer together than the pacing interval. The rolling write
//! ceiling is unaffected: each write still consumes one permit.
//!
//! # Reads
//!
//! Reads are never paced. `has` touches exactly one key; `get_all`, `stats`
//! and `clear` fan out to all buckets concurrently.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use futures::future::try_join_all;
use osmosis_storage::{RateLimitConfig, RateLimiter, StorageBackend};
use tokio::sync::Mutex;

use crate::{
    clock::{Clock, SystemClock},
    codec::{
        Bucket, ITEM_SEPARATOR, KV_SEPARATOR, byte_size, deserialize_bucket, hash_string,
        serialize_bucket,
    },
    config::VaultConfig,
    error::{VaultError, VaultResult},
    provider::{StorageStats, VaultProvider, WordEntry, WordMap},
    settings::ProviderKind,
};

/// Number of buckets.
///
/// Part of the stored layout: changing it reroutes every word and orphans
/// existing data.
pub const BUCKET_COUNT: usize = 16;

/// Returns the index of the bucket that owns `word`.
#[must_use]
pub fn bucket_index(word: &str) -> usize {
    // u32 always fits usize on supported targets.
    hash_string(word) as usize % BUCKET_COUNT
}

/// Vault provider that packs words into hash buckets.
pub struct BucketedVaultProvider<B> {
    backend: Arc<B>,
    config: VaultConfig,
    limiter: RateLimiter,
    clock: Arc<dyn Clock>,
    locks: [Mutex<()>; BUCKET_COUNT],
}

impl<B: StorageBackend> BucketedVaultProvider<B> {
    /// Creates a provider over `backend` using the system clock.
    pub fn new(backend: Arc<B>, config: VaultConfig) -> Self {
        // VaultConfig rejects a zero interval, so the fallback is unreachable.
        let rate_limit = RateLimitConfig::new(config.min_write_interval()).unwrap_or_default();
        Self {
            backend,
            config,
            limiter: RateLimiter::new(rate_limit),
            clock: Arc::new(SystemClock),
            locks: std::array::from_fn(|_| Mutex::new(())),
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

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Returns the write pacer.
    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Returns the storage key of the bucket that owns `word`.
    #[must_use]
    pub fn bucket_key_for(&self, word: &str) -> String {
        self.bucket_key(bucket_index(word))
    }

    /// Returns the storage keys of all buckets, in index order.
    #[must_use]
    pub fn bucket_keys(&self) -> Vec<String> {
        (0..BUCKET_COUNT).map(|index| self.bucket_key(index)).collect()
    }

    fn bucket_key(&self, index: usize) -> String {
        format!("{}{index}", self.config.bucket_prefix())
    }

    /// Reads the raw bucket string. Absent keys and non-UTF-8 values both
    /// read as empty.
    async fn read_raw(&self, key: &str) -> VaultResult<Option<String>> {
        let Some(bytes) = self.backend.get(key.as_bytes()).await? else {
            return Ok(None);
        };
        match String::from_utf8(bytes.to_vec()) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) => {
                tracing::warn!(key, error = %e, "bucket value is not UTF-8, reading as empty");
                Ok(None)
            },
        }
    }

    async fn read_bucket(&self, key: &str) -> VaultResult<Bucket> {
        Ok(self.read_raw(key).await?.map(|raw| deserialize_bucket(&raw)).unwrap_or_default())
    }

    async fn read_all_raw(&self) -> VaultResult<Vec<Option<String>>> {
        let keys = self.bucket_keys();
        try_join_all(keys.iter().map(|key| self.read_raw(key))).await
    }
}

impl<B> fmt::Debug for BucketedVaultProvider<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketedVaultProvider")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

fn ensure_encodable(word: &str) -> VaultResult<()> {
    if word.is_empty() {
        return Err(VaultError::invalid_word(word, "word is empty"));
    }
    if word.contains([ITEM_SEPARATOR, KV_SEPARATOR]) {
        return Err(VaultError::invalid_word(word, "word contains a bucket separator"));
    }
    Ok(())
}

#[async_trait]
impl<B: StorageBackend> VaultProvider for BucketedVaultProvider<B> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Sync
    }

    #[tracing::instrument(skip(self))]
    async fn get_all(&self) -> VaultResult<WordMap> {
        let mut words = WordMap::new();
        for raw in self.read_all_raw().await?.into_iter().flatten() {
            for (word, created_at) in deserialize_bucket(&raw) {
                words.insert(word.clone(), WordEntry { word, created_at });
            }
        }
        Ok(words)
    }

    #[tracing::instrument(skip(self))]
    async fn add(&self, word: &str) -> VaultResult<()> {
        ensure_encodable(word)?;
        let index = bucket_index(word);
        let key = self.bucket_key(index);

        self.limiter.wait().await;
        let _guard = self.locks[index].lock().await;

        let mut bucket = self.read_bucket(&key).await?;
        if bucket.contains_key(word) {
            tracing::debug!(key = %key, "word already starred");
            return Ok(());
        }
        bucket.insert(word.to_owned(), self.clock.now_millis());

        let encoded = serialize_bucket(&bucket);
        let size = byte_size(&encoded);
        let limit = self.config.max_bytes_per_bucket();
        if size > limit {
            return Err(VaultError::BucketFull { key, size, limit });
        }

        self.backend
            .set(key.into_bytes(), encoded.into_bytes())
            .await
            .map_err(VaultError::from_write)
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, word: &str) -> VaultResult<()> {
        let index = bucket_index(word);
        let key = self.bucket_key(index);

        self.limiter.wait().await;
        let _guard = self.locks[index].lock().await;

        let mut bucket = self.read_bucket(&key).await?;
        if bucket.remove(word).is_none() {
            tracing::debug!(key = %key, "word not starred");
            return Ok(());
        }

        let result = if bucket.is_empty() {
            self.backend.delete(key.as_bytes()).await
        } else {
            self.backend.set(key.into_bytes(), serialize_bucket(&bucket).into_bytes()).await
        };
        result.map_err(VaultError::from_write)
    }

    #[tracing::instrument(skip(self))]
    async fn has(&self, word: &str) -> VaultResult<bool> {
        Ok(self.read_bucket(&self.bucket_key_for(word)).await?.contains_key(word))
    }

    #[tracing::instrument(skip(self))]
    async fn clear(&self) -> VaultResult<()> {
        let keys = self.bucket_keys();
        try_join_all(keys.iter().map(|key| self.backend.delete(key.as_bytes())))
            .await
            .map_err(VaultError::from_write)?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn stats(&self) -> VaultResult<StorageStats> {
        let mut stats = StorageStats { chunk_count: BUCKET_COUNT, ..StorageStats::default() };
        for raw in self.read_all_raw().await?.into_iter().flatten() {
            stats.bytes_used += byte_size(&raw);
            stats.items_count += deserialize_bucket(&raw).len();
        }
        Ok(stats)
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
    use crate::{codec::ANCHOR_MS, testutil::ManualClock};

    /// 2025-01-01T00:00:00Z.
    const NOW: i64 = 1_735_689_600_000;

    fn provider<B: StorageBackend>(backend: B) -> BucketedVaultProvider<B> {
        BucketedVaultProvider::new(Arc::new(backend), VaultConfig::default())
            .with_clock(Arc::new(ManualClock::new(NOW)))
    }

    async fn raw(backend: &MemoryBackend, key: &str) -> Option<String> {
        backend
            .get(key.as_bytes())
            .await
            .unwrap()
            .map(|b| String::from_utf8(b.to_vec()).unwrap())
    }

    #[test]
    fn bucket_routing_is_stable() {
        let p = provider(MemoryBackend::new());
        assert_eq!(p.bucket_key_for("apple"), "vault_7");
        assert_eq!(p.bucket_key_for("cat"), "vault_13");
        assert_eq!(p.bucket_key_for("pear"), "vault_13");
        for _ in 0..3 {
            assert_eq!(p.bucket_key_for("cherry"), "vault_2");
        }
    }

    #[test]
    fn bucket_keys_cover_every_index() {
        let keys = provider(MemoryBackend::new()).bucket_keys();
        assert_eq!(keys.len(), BUCKET_COUNT);
        assert_eq!(keys.first().unwrap(), "vault_0");
        assert_eq!(keys.last().unwrap(), "vault_15");
    }

    #[test]
    fn custom_prefix_is_used() {
        let config = VaultConfig::builder().bucket_prefix("stars/").build().unwrap();
        let p = BucketedVaultProvider::new(Arc::new(MemoryBackend::new()), config);
        assert_eq!(p.bucket_key_for("apple"), "stars/7");
    }

    #[tokio::test(start_paused = true)]
    async fn add_writes_compact_bucket() {
        let p = provider(MemoryBackend::new());
        p.add("apple").await.unwrap();

        assert_eq!(raw(p.backend(), "vault_7").await.as_deref(), Some("apple:bao0"));
        assert_eq!(p.backend().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn words_sharing_a_bucket_share_a_key() {
        let p = provider(MemoryBackend::new());
        p.add("pear").await.unwrap();
        p.add("cat").await.unwrap();

        assert_eq!(raw(p.backend(), "vault_13").await.as_deref(), Some("cat:bao0|pear:bao0"));
        assert_eq!(p.backend().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn add_is_idempotent() {
        let clock = Arc::new(ManualClock::new(NOW));
        let p = BucketedVaultProvider::new(Arc::new(MemoryBackend::new()), VaultConfig::default())
            .with_clock(clock.clone());

        p.add("cat").await.unwrap();
        clock.advance(Duration::from_secs(3600));
        p.add("cat").await.unwrap();

        let words = p.get_all().await.unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words["cat"].created_at, NOW);
    }

    #[tokio::test(start_paused = true)]
    async fn removing_last_word_deletes_bucket_key() {
        let p = provider(MemoryBackend::new());
        p.add("apple").await.unwrap();
        assert!(p.backend().contains_key(b"vault_7"));

        p.remove("apple").await.unwrap();

        assert!(!p.backend().contains_key(b"vault_7"));
        assert!(p.backend().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn removing_one_of_several_rewrites_bucket() {
        let p = provider(MemoryBackend::new());
        p.add("pear").await.unwrap();
        p.add("cat").await.unwrap();

        p.remove("pear").await.unwrap();

        assert_eq!(raw(p.backend(), "vault_13").await.as_deref(), Some("cat:bao0"));
    }

    #[tokio::test(start_paused = true)]
    async fn removing_absent_word_writes_nothing() {
        let p = provider(CountingBackend::new(MemoryBackend::new()));
        p.remove("ghost").await.unwrap();

        let counts = p.backend().counts();
        assert_eq!((counts.sets, counts.deletes), (0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn has_reads_exactly_one_bucket() {
        let p = provider(CountingBackend::new(MemoryBackend::new()));
        p.add("apple").await.unwrap();
        p.backend().reset();

        assert!(p.has("apple").await.unwrap());

        assert_eq!(p.backend().counts().gets, 1);
        assert_eq!(p.backend().read_keys(), vec![b"vault_7".to_vec()]);
    }

    #[tokio::test(start_paused = true)]
    async fn get_all_reads_every_bucket() {
        let p = provider(CountingBackend::new(MemoryBackend::new()));
        p.add("apple").await.unwrap();
        p.add("cat").await.unwrap();
        p.backend().reset();

        let words = p.get_all().await.unwrap();

        assert_eq!(words.keys().collect::<Vec<_>>(), ["apple", "cat"]);
        assert_eq!(words["apple"], WordEntry::new("apple", NOW));
        assert_eq!(p.backend().counts().gets, BUCKET_COUNT);
    }

    #[tokio::test(start_paused = true)]
    async fn get_all_skips_corrupt_entries() {
        let backend = MemoryBackend::new();
        backend.set(b"vault_7".to_vec(), b"apple:0|broken|:3|bad:??".to_vec()).await.unwrap();
        backend.set(b"vault_2".to_vec(), vec![0xff, 0xfe]).await.unwrap();
        let p = provider(backend);

        let words = p.get_all().await.unwrap();

        assert_eq!(words.len(), 1);
        assert_eq!(words["apple"].created_at, ANCHOR_MS);
    }

    #[tokio::test(start_paused = true)]
    async fn add_over_corrupt_bucket_keeps_readable_entries() {
        let backend = MemoryBackend::new();
        backend.set(b"vault_13".to_vec(), b"pear:1|junk".to_vec()).await.unwrap();
        let p = provider(backend);

        p.add("cat").await.unwrap();

        assert_eq!(raw(p.backend(), "vault_13").await.as_deref(), Some("cat:bao0|pear:1"));
    }

    #[tokio::test(start_paused = true)]
    async fn bucket_full_leaves_bucket_unchanged() {
        let config = VaultConfig::builder().max_bytes_per_bucket(19).build().unwrap();
        let p = BucketedVaultProvider::new(Arc::new(MemoryBackend::new()), config)
            .with_clock(Arc::new(ManualClock::new(NOW)));
        p.add("pear").await.unwrap();
        let before = raw(p.backend(), "vault_13").await;

        // "koala:bao0|pear:bao0" is 20 bytes.
        assert_eq!(p.bucket_key_for("koala"), "vault_13");
        let err = p.add("koala").await.unwrap_err();

        assert!(
            matches!(err, VaultError::BucketFull { ref key, size: 20, limit: 19 } if key == "vault_13"),
            "{err:?}"
        );
        assert_eq!(raw(p.backend(), "vault_13").await, before);
        assert!(!p.has("koala").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn backend_quota_maps_to_quota_exceeded() {
        let p = provider(FailingBackend::new(MemoryBackend::new()));
        p.backend().fail_writes(InjectedFailure::QuotaExceeded);

        let err = p.add("apple").await.unwrap_err();

        assert!(matches!(err, VaultError::QuotaExceeded { .. }), "{err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn other_backend_failures_propagate() {
        let p = provider(FailingBackend::new(MemoryBackend::new()));
        p.backend().fail_writes(InjectedFailure::Connection);

        let err = p.add("apple").await.unwrap_err();

        assert!(matches!(err, VaultError::Storage(_)), "{err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn add_rejects_separator_characters() {
        let p = provider(MemoryBackend::new());
        for word in ["", "a|b", "a:b"] {
            assert!(matches!(p.add(word).await, Err(VaultError::InvalidWord { .. })), "{word:?}");
        }
        assert!(p.backend().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_deletes_every_bucket_without_pacing() {
        let p = provider(MemoryBackend::new());
        for word in ["apple", "cat", "cherry"] {
            p.add(word).await.unwrap();
        }
        let before = p.rate_limiter().metrics_snapshot();
        let start = tokio::time::Instant::now();

        p.clear().await.unwrap();

        assert!(p.backend().is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(p.rate_limiter().metrics_snapshot(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn stats_sum_bucket_sizes() {
        let p = provider(MemoryBackend::new());
        p.add("apple").await.unwrap();
        p.add("pear").await.unwrap();
        p.add("cat").await.unwrap();

        let stats = p.stats().await.unwrap();

        // "apple:bao0" + "cat:bao0|pear:bao0"
        assert_eq!(stats, StorageStats { bytes_used: 10 + 18, items_count: 3, chunk_count: 16 });
    }

    #[tokio::test(start_paused = true)]
    async fn empty_vault_stats() {
        let stats = provider(MemoryBackend::new()).stats().await.unwrap();
        assert_eq!(stats, StorageStats { bytes_used: 0, items_count: 0, chunk_count: 16 });
    }

    #[tokio::test(start_paused = true)]
    async fn writes_are_paced_reads_are_not() {
        let p = provider(MemoryBackend::new());
        let start = tokio::time::Instant::now();

        p.add("apple").await.unwrap();
        p.add("cat").await.unwrap();
        p.remove("apple").await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(1000));

        let _ = p.get_all().await.unwrap();
        let _ = p.has("cat").await.unwrap();
        let _ = p.stats().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn paced_writes_stay_under_sync_write_ceiling() {
        let p = provider(MemoryBackend::sync_area());
        for i in 0..150u32 {
            let word: String =
                (0..6).map(|d| char::from(b'a' + ((i >> (d * 4)) & 0xf) as u8)).collect();
            p.add(&word).await.unwrap();
        }
        assert_eq!(p.stats().await.unwrap().items_count, 150);
    }
}
