//! Benchmarks for the bucket codec and routing hash.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use osmosis_vault::{
    bucketed::bucket_index,
    codec::{ANCHOR_MS, Bucket, deserialize_bucket, hash_string, serialize_bucket},
};

/// A bucket of `n` ten-letter words spread over a year of timestamps.
fn make_bucket(n: usize) -> Bucket {
    (0..n)
        .map(|i| {
            let word: String =
                (0..10).map(|d| char::from(b'a' + ((i * 7 + d * 3) % 26) as u8)).collect();
            let offset = (i as i64 * 86_400_000) % (365 * 86_400_000);
            (format!("{word}{i}"), ANCHOR_MS + offset)
        })
        .collect()
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize_bucket");
    for size in [10, 100, 400] {
        let bucket = make_bucket(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bucket, |b, bucket| {
            b.iter(|| serialize_bucket(black_box(bucket)));
        });
    }
    group.finish();
}

fn bench_deserialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("deserialize_bucket");
    for size in [10, 100, 400] {
        let encoded = serialize_bucket(&make_bucket(size));
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| deserialize_bucket(black_box(encoded)));
        });
    }
    group.finish();
}

fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");
    group.bench_function("hash_string", |b| {
        b.iter(|| hash_string(black_box("internationalization")));
    });
    group.bench_function("bucket_index", |b| {
        b.iter(|| bucket_index(black_box("serendipity")));
    });
    group.finish();
}

criterion_group!(benches, bench_serialize, bench_deserialize, bench_hash);
criterion_main!(benches);
