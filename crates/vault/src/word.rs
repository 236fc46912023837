//! Word normalization.
//!
//! The page matcher only ever produces runs of ASCII letters, so anything
//! else reaching the vault is a caller bug. Rejecting it here also keeps the
//! codec's separator characters out of stored buckets.

use crate::error::{VaultError, VaultResult};

/// Trims and lowercases `input`.
///
/// # Errors
///
/// Returns [`VaultError::InvalidWord`] if the trimmed input is empty or
/// contains anything other than ASCII letters.
pub fn normalize_word(input: &str) -> VaultResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(VaultError::invalid_word(input, "word is empty"));
    }
    if !trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(VaultError::invalid_word(input, "word must contain only ASCII letters"));
    }
    Ok(trimmed.to_ascii_lowercase())
}
