//! The vault facade used by the message layer.
//!
//! [`VaultService`] owns both providers, normalizes every incoming word and
//! asks its [`SettingsSource`] which provider to use on every call. Nothing
//! about the selection is cached, so a settings change applies to the very
//! next operation.

use std::{cmp::Reverse, fmt, sync::Arc};

use osmosis_storage::StorageBackend;

use crate::{
    bucketed::BucketedVaultProvider,
    clock::Clock,
    config::VaultConfig,
    error::{VaultError, VaultResult},
    flat::FlatVaultProvider,
    provider::{StorageStats, VaultProvider, WordEntry, WordMap},
    settings::{ProviderKind, SettingsSource, StoredSettings},
    word::normalize_word,
};

/// Starred-word vault over a sync area and a local area.
pub struct VaultService<S, L> {
    sync: BucketedVaultProvider<S>,
    local: FlatVaultProvider<L>,
    settings: Arc<dyn SettingsSource>,
}

impl<S: StorageBackend, L: StorageBackend> VaultService<S, L> {
    /// Creates a service over the two storage areas.
    pub fn new(
        sync_backend: Arc<S>,
        local_backend: Arc<L>,
        settings: Arc<dyn SettingsSource>,
        config: VaultConfig,
    ) -> Self {
        let local = FlatVaultProvider::new(local_backend, &config);
        let sync = BucketedVaultProvider::new(sync_backend, config);
        Self { sync, local, settings }
    }

    /// Creates a service that reads provider selection from the settings
    /// document stored under [`VaultConfig::settings_key`] in
    /// `settings_area`.
    pub fn from_areas<T: StorageBackend + 'static>(
        sync_backend: Arc<S>,
        local_backend: Arc<L>,
        settings_area: Arc<T>,
        config: VaultConfig,
    ) -> Self {
        let settings = Arc::new(StoredSettings::new(settings_area, config.settings_key()));
        Self::new(sync_backend, local_backend, settings, config)
    }

    /// Replaces the clock both providers stamp new words with.
    #[must_use]
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            sync: self.sync.with_clock(Arc::clone(&clock)),
            local: self.local.with_clock(clock),
            settings: self.settings,
        }
    }

    /// Returns the bucketed sync-area provider.
    #[must_use]
    pub fn sync_provider(&self) -> &BucketedVaultProvider<S> {
        &self.sync
    }

    /// Returns the single-document local-area provider.
    #[must_use]
    pub fn local_provider(&self) -> &FlatVaultProvider<L> {
        &self.local
    }

    /// Resolves the provider selected by the current settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings source fails.
    pub async fn provider(&self) -> VaultResult<&dyn VaultProvider> {
        let provider: &dyn VaultProvider = match self.settings.provider_kind().await? {
            ProviderKind::Sync => &self.sync,
            ProviderKind::Local => &self.local,
        };
        Ok(provider)
    }

    /// Returns every starred word, most recently starred first.
    ///
    /// Words starred in the same instant are ordered alphabetically.
    ///
    /// # Errors
    ///
    /// Returns an error if settings or storage cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn words(&self) -> VaultResult<Vec<WordEntry>> {
        let mut entries: Vec<WordEntry> = self.word_map().await?.into_values().collect();
        // `into_values` yields word order, and the sort is stable.
        entries.sort_by_key(|entry| Reverse(entry.created_at));
        Ok(entries)
    }

    /// Returns every starred word keyed by itself.
    ///
    /// # Errors
    ///
    /// Returns an error if settings or storage cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn word_map(&self) -> VaultResult<WordMap> {
        self.provider().await?.get_all().await
    }

    /// Returns the starred words alone, most recently starred first.
    ///
    /// This is the payload content scripts use to mark words on a page.
    ///
    /// # Errors
    ///
    /// Returns an error if settings or storage cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn starred_keys(&self) -> VaultResult<Vec<String>> {
        Ok(self.words().await?.into_iter().map(|entry| entry.word).collect())
    }

    /// Stars a word after normalizing it.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidWord`] for input that does not normalize,
    /// [`VaultError::BucketFull`] or [`VaultError::QuotaExceeded`] when the
    /// active area is out of room, or any storage error.
    #[tracing::instrument(skip(self))]
    pub async fn add_word(&self, word: &str) -> VaultResult<()> {
        let word = normalize_word(word)?;
        self.provider().await?.add(&word).await
    }

    /// Unstars a word after normalizing it.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidWord`] for input that does not normalize,
    /// or any storage error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_word(&self, word: &str) -> VaultResult<()> {
        let word = normalize_word(word)?;
        self.provider().await?.remove(&word).await
    }

    /// Returns whether a word is starred.
    ///
    /// Input that does not normalize can never have been stored, so it
    /// answers `false` without reading storage.
    ///
    /// # Errors
    ///
    /// Returns an error if settings or storage cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn has_word(&self, word: &str) -> VaultResult<bool> {
        let word = match normalize_word(word) {
            Ok(word) => word,
            Err(VaultError::InvalidWord { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        self.provider().await?.has(&word).await
    }

    /// Removes every word from the active provider.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be read or a delete fails.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self) -> VaultResult<()> {
        self.provider().await?.clear().await
    }

    /// Reports the active provider's storage footprint.
    ///
    /// # Errors
    ///
    /// Returns an error if settings or storage cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn storage_stats(&self) -> VaultResult<StorageStats> {
        self.provider().await?.stats().await
    }
}

impl<S: StorageBackend, L: StorageBackend> fmt::Debug for VaultService<S, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultService")
            .field(self.sync.kind().to_string().as_str(), &self.sync)
            .field(self.local.kind().to_string().as_str(), &self.local)
            .finish_non_exhaustive()
    }
}
