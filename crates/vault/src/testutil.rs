//! Shared test utilities for vault providers.
//!
//! Feature-gated behind `testutil`. Storage-level wrappers such as
//! `CountingBackend` live in `osmosis_storage::testutil`.

use std::{
    sync::atomic::{AtomicI64, Ordering},
    time::Duration,
};

use crate::clock::Clock;

/// A [`Clock`] that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a clock reading `now_millis`.
    pub fn new(now_millis: i64) -> Self {
        Self { now: AtomicI64::new(now_millis) }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let millis = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Sets the clock to `now_millis`.
    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Assert that a [`VaultResult`](crate::VaultResult) is an error of the
/// given [`VaultError`](crate::VaultError) variant.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use osmosis_vault::{VaultError, VaultResult, assert_vault_error};
///
/// let result: VaultResult<()> = Err(VaultError::invalid_word("", "word is empty"));
/// assert_vault_error!(result, InvalidWord);
/// ```
#[macro_export]
macro_rules! assert_vault_error {
    ($result:expr, Storage) => {
        match $result {
            Err($crate::error::VaultError::Storage(_)) => {},
            other => panic!("expected VaultError::Storage, got: {:?}", other),
        }
    };
    ($result:expr, Config) => {
        match $result {
            Err($crate::error::VaultError::Config(_)) => {},
            other => panic!("expected VaultError::Config, got: {:?}", other),
        }
    };
    ($result:expr, $variant:ident) => {
        match $result {
            Err($crate::error::VaultError::$variant { .. }) => {},
            other => panic!(
                "expected VaultError::{}, got: {:?}",
                stringify!($variant),
                other
            ),
        }
    };
}
