//! User settings that select the active vault provider.
//!
//! The options page writes a JSON settings document; the vault only reads
//! the `vaultProvider` field from it. The document is re-read on every vault
//! call, so switching provider takes effect without a restart.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use osmosis_storage::{StorageBackend, StorageError};
use serde::{Deserialize, Serialize};

use crate::error::VaultResult;

/// The storage area a provider writes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// The quota-constrained synchronized area, bucketed.
    #[default]
    Sync,
    /// The unconstrained local area, one document.
    Local,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => f.write_str("sync"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// The fields of the settings document the vault cares about.
///
/// Other fields written by the options page are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Selected provider.
    #[serde(default)]
    pub vault_provider: ProviderKind,
}

/// Source of the active provider selection.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Returns the currently selected provider kind.
    async fn provider_kind(&self) -> VaultResult<ProviderKind>;
}

/// Reads the settings document from a storage backend.
///
/// A missing document selects the default provider. A document that does
/// not parse also selects the default, with a warning: broken settings must
/// never lock the user out of their words.
pub struct StoredSettings<B> {
    backend: Arc<B>,
    key: String,
}

impl<B: StorageBackend> StoredSettings<B> {
    /// Reads settings from `key` in `backend`.
    pub fn new(backend: Arc<B>, key: impl Into<String>) -> Self {
        Self { backend, key: key.into() }
    }

    /// Writes `settings` to the backend, as the options page does.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub async fn store(&self, settings: &Settings) -> VaultResult<()> {
        let json = serde_json::to_vec(settings)
            .map_err(|e| StorageError::serialization_with_source("settings document", e))?;
        self.backend.set(self.key.clone().into_bytes(), json).await?;
        Ok(())
    }
}

impl<B> fmt::Debug for StoredSettings<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSettings").field("key", &self.key).finish_non_exhaustive()
    }
}

#[async_trait]
impl<B: StorageBackend> SettingsSource for StoredSettings<B> {
    async fn provider_kind(&self) -> VaultResult<ProviderKind> {
        let Some(raw) = self.backend.get(self.key.as_bytes()).await? else {
            return Ok(ProviderKind::default());
        };
        match serde_json::from_slice::<Settings>(&raw) {
            Ok(settings) => Ok(settings.vault_provider),
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "unreadable settings document, using default provider"
                );
                Ok(ProviderKind::default())
            },
        }
    }
}

/// A settings source that always selects the same provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedSettings(pub ProviderKind);

#[async_trait]
impl SettingsSource for FixedSettings {
    async fn provider_kind(&self) -> VaultResult<ProviderKind> {
        Ok(self.0)
    }
}
