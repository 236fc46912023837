//! Starred-word vault for Osmosis.
//!
//! The vault remembers which English words the user has starred, and when.
//! It persists to one of two storage areas:
//!
//! | Area | Provider | Layout |
//! |------|----------|--------|
//! | sync (quota-constrained, synchronized) | [`BucketedVaultProvider`] | 16 hash buckets, compact [`codec`] strings, paced writes |
//! | local (unconstrained) | [`FlatVaultProvider`] | one JSON document |
//!
//! [`VaultService`] sits in front of both, normalizes input and picks the
//! provider from the user's settings on every call.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use osmosis_storage::MemoryBackend;
//! use osmosis_vault::{FixedSettings, ProviderKind, VaultConfig, VaultService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vault = VaultService::new(
//!         Arc::new(MemoryBackend::sync_area()),
//!         Arc::new(MemoryBackend::local_area()),
//!         Arc::new(FixedSettings(ProviderKind::Sync)),
//!         VaultConfig::default(),
//!     );
//!
//!     vault.add_word("Serendipity").await?;
//!     assert!(vault.has_word("serendipity").await?);
//!
//!     for entry in vault.words().await? {
//!         println!("{} starred at {}", entry.word, entry.created_at);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Operations return [`VaultResult<T>`]. Callers distinguish rejected input
//! ([`VaultError::InvalidWord`]), an overloaded sync bucket
//! ([`VaultError::BucketFull`]) and a full storage area
//! ([`VaultError::QuotaExceeded`]). Malformed stored data is skipped, not
//! reported.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module (manual clock, `assert_vault_error!`) and the
//!   `conformance` suite every [`VaultProvider`] must pass.

#![deny(unsafe_code)]

pub mod bucketed;
pub mod clock;
pub mod codec;
pub mod config;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod conformance;
pub mod error;
pub mod flat;
pub mod provider;
pub mod service;
pub mod settings;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
pub mod word;

pub use bucketed::{BUCKET_COUNT, BucketedVaultProvider};
pub use clock::{Clock, SystemClock};
pub use config::VaultConfig;
pub use error::{VaultError, VaultResult};
pub use flat::FlatVaultProvider;
pub use provider::{StorageStats, VaultProvider, WordEntry, WordMap};
pub use service::VaultService;
pub use settings::{FixedSettings, ProviderKind, Settings, SettingsSource, StoredSettings};
pub use word::normalize_word;
