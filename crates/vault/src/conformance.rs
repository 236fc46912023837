//! Conformance suite for [`VaultProvider`] implementations.
//!
//! Each function checks one clause of the provider contract against a fresh,
//! empty provider. Both built-in layouts run the whole suite; a new layout
//! must pass it too.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use osmosis_storage::MemoryBackend;
//! use osmosis_vault::{FlatVaultProvider, VaultConfig, conformance};
//!
//! #[tokio::test]
//! async fn add_is_idempotent() {
//!     let provider = FlatVaultProvider::new(Arc::new(MemoryBackend::new()), &VaultConfig::default());
//!     conformance::add_is_idempotent(&provider).await;
//! }
//! ```
//!
//! Providers that pace writes should be exercised under
//! `#[tokio::test(start_paused = true)]`.

use futures::future::join_all;

use crate::provider::VaultProvider;

// ============================================================================
// Reads on an empty vault
// ============================================================================

/// A fresh provider holds nothing.
pub async fn empty_vault_reads_empty<P: VaultProvider>(provider: &P) {
    assert!(provider.get_all().await.expect("get_all").is_empty());
    assert!(!provider.has("apple").await.expect("has"));
    assert_eq!(provider.stats().await.expect("stats").items_count, 0);
}

// ============================================================================
// Add / has / get_all
// ============================================================================

/// An added word is reported by `has` and `get_all`.
pub async fn add_then_has<P: VaultProvider>(provider: &P) {
    provider.add("apple").await.expect("add");

    assert!(provider.has("apple").await.expect("has"));
    assert!(!provider.has("banana").await.expect("has other"));

    let words = provider.get_all().await.expect("get_all");
    assert_eq!(words.len(), 1);
    let entry = words.get("apple").expect("entry for apple");
    assert_eq!(entry.word, "apple");
}

/// Adding a word twice keeps one entry and its first timestamp.
pub async fn add_is_idempotent<P: VaultProvider>(provider: &P) {
    provider.add("cat").await.expect("first add");
    let first = provider.get_all().await.expect("get_all")["cat"].created_at;

    provider.add("cat").await.expect("second add");

    let words = provider.get_all().await.expect("get_all");
    assert_eq!(words.len(), 1);
    assert_eq!(words["cat"].created_at, first);
}

/// Many distinct words are all retained.
pub async fn many_words_round_trip<P: VaultProvider>(provider: &P) {
    let words: Vec<String> = (b'a'..=b'z').map(|c| format!("word{}", char::from(c))).collect();
    for word in &words {
        provider.add(word).await.expect("add");
    }

    let stored = provider.get_all().await.expect("get_all");
    assert_eq!(stored.len(), words.len());
    for word in &words {
        assert!(stored.contains_key(word), "{word} missing");
        assert!(provider.has(word).await.expect("has"), "{word} not reported by has");
    }
}

// ============================================================================
// Remove / clear
// ============================================================================

/// A removed word is gone; others stay.
pub async fn remove_then_has_false<P: VaultProvider>(provider: &P) {
    provider.add("apple").await.expect("add apple");
    provider.add("banana").await.expect("add banana");

    provider.remove("apple").await.expect("remove");

    assert!(!provider.has("apple").await.expect("has apple"));
    assert!(provider.has("banana").await.expect("has banana"));
    assert_eq!(provider.get_all().await.expect("get_all").len(), 1);
}

/// Removing a word that was never added is a silent no-op.
pub async fn remove_absent_is_noop<P: VaultProvider>(provider: &P) {
    provider.add("apple").await.expect("add");
    provider.remove("ghost").await.expect("remove absent");
    assert_eq!(provider.get_all().await.expect("get_all").len(), 1);
}

/// `clear` removes every word and leaves the provider usable.
pub async fn clear_removes_everything<P: VaultProvider>(provider: &P) {
    for word in ["apple", "banana", "cherry"] {
        provider.add(word).await.expect("add");
    }

    provider.clear().await.expect("clear");

    assert!(provider.get_all().await.expect("get_all").is_empty());
    assert_eq!(provider.stats().await.expect("stats").items_count, 0);

    provider.add("apple").await.expect("add after clear");
    assert!(provider.has("apple").await.expect("has after clear"));
}

// ============================================================================
// Stats
// ============================================================================

/// `stats` counts stored words and reports a non-zero chunk count.
pub async fn stats_count_items<P: VaultProvider>(provider: &P) {
    for word in ["apple", "banana", "cherry"] {
        provider.add(word).await.expect("add");
    }

    let stats = provider.stats().await.expect("stats");
    assert_eq!(stats.items_count, 3);
    assert!(stats.bytes_used > 0);
    assert!(stats.chunk_count >= 1);
}

// ============================================================================
// Concurrency
// ============================================================================

/// Concurrent adds of distinct words all survive.
pub async fn concurrent_adds_all_survive<P: VaultProvider>(provider: &P) {
    let words = ["koala", "pear", "cat", "toad", "wolf", "crab", "apple", "camel"];

    let results = join_all(words.iter().map(|word| provider.add(word))).await;
    for result in results {
        result.expect("concurrent add");
    }

    let stored = provider.get_all().await.expect("get_all");
    for word in words {
        assert!(stored.contains_key(word), "{word} lost to a concurrent write");
    }
}
