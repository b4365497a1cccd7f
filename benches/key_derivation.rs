//! Key derivation and create-path benchmarks
//!
//! ## Groups
//!
//! - `codec_*`: canonical encoding and key derivation only (no ledger)
//! - `memory_*`: full create/read path through TxContract over MemoryLedger
//! - `file_*`: create path over FileLedger, labelled by sync mode
//! - `file_reopen/*`: log replay cost on open
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench key_derivation
//! cargo bench --bench key_derivation -- "codec_"  # specific group
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use txledger::contract::TxContract;
use txledger::core::{RecordCodec, Transaction, TxCodec};
use txledger::storage::{FileLedger, MemoryLedger, SyncMode};

fn codec_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Elements(1));

    for len in [8usize, 64, 1024] {
        let tx = Transaction::new("b".repeat(len), 1_700_000_000);
        group.bench_with_input(BenchmarkId::new("codec_encode", len), &tx, |b, tx| {
            b.iter(|| TxCodec.encode(black_box(tx)))
        });
        group.bench_with_input(BenchmarkId::new("codec_key_of", len), &tx, |b, tx| {
            b.iter(|| TxCodec.key_of(black_box(tx)))
        });
        let bytes = TxCodec.encode(&tx);
        group.bench_with_input(BenchmarkId::new("codec_decode", len), &bytes, |b, bytes| {
            b.iter(|| TxCodec.decode(black_box(bytes)))
        });
    }

    let escaped = Transaction::new("<tag> & \"quote\"\n".repeat(16), 0);
    group.bench_function("codec_encode/escaped", |b| {
        b.iter(|| TxCodec.encode(black_box(&escaped)))
    });
    group.finish();
}

fn memory_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory");
    group.throughput(Throughput::Elements(1));

    let contract = TxContract::new(MemoryLedger::new());
    let counter = AtomicI64::new(0);
    group.bench_function("memory_create/unique", |b| {
        b.iter(|| {
            let ts = counter.fetch_add(1, Ordering::Relaxed);
            contract.create_tx("bench", ts)
        })
    });

    let key = contract.create_tx("hot", -1).map(|k| k.into_string());
    if let Ok(key) = key {
        group.bench_function("memory_read/hot_key", |b| {
            b.iter(|| contract.read_tx(black_box(&key)))
        });
    }
    group.bench_function("memory_create/duplicate", |b| {
        b.iter(|| contract.create_tx("hot", -1))
    });
    group.finish();
}

fn file_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("file");
    group.throughput(Throughput::Elements(1));

    for (label, sync) in [("sync_none", SyncMode::None), ("sync_always", SyncMode::Always)] {
        let dir = TempDir::new().unwrap();
        let contract = TxContract::new(FileLedger::open_with(dir.path(), sync).unwrap());
        let counter = AtomicI64::new(0);
        group.bench_function(BenchmarkId::new("file_create", label), |b| {
            b.iter(|| {
                let ts = counter.fetch_add(1, Ordering::Relaxed);
                contract.create_tx("bench", ts)
            })
        });
    }
    group.finish();
}

fn reopen_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_reopen");

    for records in [100i64, 10_000] {
        let dir = TempDir::new().unwrap();
        {
            let contract =
                TxContract::new(FileLedger::open_with(dir.path(), SyncMode::None).unwrap());
            for ts in 0..records {
                contract.create_tx("replay", ts).unwrap();
            }
        }
        group.throughput(Throughput::Elements(records as u64));
        group.bench_with_input(BenchmarkId::from_parameter(records), &dir, |b, dir| {
            b.iter(|| FileLedger::open_with(dir.path(), SyncMode::None).unwrap())
        });
    }
    group.finish();
}

criterion_group!(codec, codec_benchmarks);
criterion_group!(ledgers, memory_benchmarks, file_benchmarks);
criterion_group!(
    name = replay;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(20);
    targets = reopen_benchmarks
);
criterion_main!(codec, ledgers, replay);
