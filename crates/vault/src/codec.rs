//! Compact bucket encoding and the bucket routing hash.
//!
//! A bucket is a set of starred words with their creation times. On the sync
//! area every byte counts, so buckets are stored as a delimited string rather
//! than JSON:
//!
//! ```text
//! apple:1a2b3|banana:1a2b4|cherry:1a2c0
//! └─┬─┘ └─┬─┘
//!  word   minutes since 2024-01-01T00:00:00Z, base 36
//! ```
//!
//! Timestamps lose sub-minute precision on the way through. Decoding never
//! fails: entries that cannot be parsed are skipped so one corrupted entry
//! does not hide the rest of the bucket.

use std::collections::BTreeMap;

/// Epoch anchor for encoded offsets: 2024-01-01T00:00:00Z in milliseconds.
pub const ANCHOR_MS: i64 = 1_704_067_200_000;

/// Separates entries within a bucket.
pub const ITEM_SEPARATOR: char = '|';

/// Separates a word from its encoded offset.
pub const KV_SEPARATOR: char = ':';

const MS_PER_MINUTE: i64 = 60_000;
const RADIX: u32 = 36;

/// Words of one bucket mapped to their creation time in epoch milliseconds.
pub type Bucket = BTreeMap<String, i64>;

/// Encodes a bucket into its compact string form.
///
/// Entries are emitted in word order, so equal buckets always encode to the
/// same string. Timestamps before the anchor encode as offset `0`.
#[must_use]
pub fn serialize_bucket(bucket: &Bucket) -> String {
    let mut out = String::new();
    for (word, &timestamp) in bucket {
        if !out.is_empty() {
            out.push(ITEM_SEPARATOR);
        }
        let minutes = timestamp.saturating_sub(ANCHOR_MS).div_euclid(MS_PER_MINUTE).max(0);
        out.push_str(word);
        out.push(KV_SEPARATOR);
        out.push_str(&encode_base36(minutes.unsigned_abs()));
    }
    out
}

/// Decodes a compact bucket string.
///
/// An empty string is an empty bucket. Entries with an empty word, a missing
/// or empty offset, or an offset that is not base 36 are skipped. Fields
/// after the second are ignored.
#[must_use]
pub fn deserialize_bucket(raw: &str) -> Bucket {
    let mut bucket = Bucket::new();
    if raw.is_empty() {
        return bucket;
    }

    for item in raw.split(ITEM_SEPARATOR) {
        let mut fields = item.split(KV_SEPARATOR);
        let (Some(word), Some(offset)) = (fields.next(), fields.next()) else {
            continue;
        };
        if word.is_empty() || offset.is_empty() {
            continue;
        }
        let Some(timestamp) = decode_offset(offset) else {
            tracing::debug!(item, "skipping bucket entry with unparseable offset");
            continue;
        };
        bucket.insert(word.to_owned(), timestamp);
    }
    bucket
}

/// Routing hash for bucket selection (djb2: seed 5381, `h * 33 + c`).
///
/// Runs over UTF-16 code units with wrapping 32-bit arithmetic. The result is
/// part of the on-storage layout and must never change.
#[must_use]
pub fn hash_string(s: &str) -> u32 {
    s.encode_utf16().fold(5381u32, |hash, unit| hash.wrapping_mul(33).wrapping_add(u32::from(unit)))
}

/// Size of an encoded value in bytes, as the storage area accounts it.
#[must_use]
pub fn byte_size(s: &str) -> usize {
    s.len()
}

fn decode_offset(offset: &str) -> Option<i64> {
    let minutes = i64::try_from(u64::from_str_radix(offset, RADIX).ok()?).ok()?;
    minutes.checked_mul(MS_PER_MINUTE)?.checked_add(ANCHOR_MS)
}

fn encode_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_owned();
    }
    let mut digits = Vec::new();
    while value > 0 {
        // `value % 36` always fits a base-36 digit.
        if let Some(digit) = char::from_digit((value % u64::from(RADIX)) as u32, RADIX) {
            digits.push(digit);
        }
        value /= u64::from(RADIX);
    }
    digits.iter().rev().collect()
}
