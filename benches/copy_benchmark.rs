//! Performance benchmarks for pcp
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pcp::config::CopyConfig;
use pcp::core::CopyEngine;
use pcp::pool::WorkerPool;
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

/// Create a test file of the specified size
fn create_test_file(dir: &std::path::Path, name: &str, size: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();

    let chunk_size = 64 * 1024;
    let chunk: Vec<u8> = (0..chunk_size).map(|i| (i % 256) as u8).collect();
    let mut remaining = size;

    while remaining > 0 {
        let to_write = remaining.min(chunk_size);
        file.write_all(&chunk[..to_write]).unwrap();
        remaining -= to_write;
    }

    path
}

fn bench_thread_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_by_threads");
    let size = 64 * 1024 * 1024;
    let dir = TempDir::new().unwrap();
    let src = create_test_file(dir.path(), "large.bin", size);
    let dst = dir.path().join("copy.bin");

    group.throughput(Throughput::Bytes(size as u64));
    for threads in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let config = CopyConfig {
                    source: src.clone(),
                    destination: dst.clone(),
                    threads,
                    ..Default::default()
                };
                black_box(CopyEngine::new(config).execute().unwrap());
            });
        });
    }
    group.finish();
}

fn bench_block_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_by_block_size");
    let size = 64 * 1024 * 1024;
    let dir = TempDir::new().unwrap();
    let src = create_test_file(dir.path(), "large.bin", size);
    let dst = dir.path().join("copy.bin");

    group.throughput(Throughput::Bytes(size as u64));
    for block in [256 * 1024u64, 4 * 1024 * 1024, 16 * 1024 * 1024] {
        group.bench_with_input(
            BenchmarkId::new("block", humansize::format_size(block, humansize::BINARY)),
            &block,
            |b, &block| {
                b.iter(|| {
                    let config = CopyConfig {
                        source: src.clone(),
                        destination: dst.clone(),
                        threads: 4,
                        block_size: Some(block),
                        ..Default::default()
                    };
                    black_box(CopyEngine::new(config).execute().unwrap());
                });
            },
        );
    }
    group.finish();
}

fn bench_pool_overhead(c: &mut Criterion) {
    let pool = WorkerPool::new(4).unwrap();

    c.bench_function("pool_1000_empty_tasks", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                pool.add_task(|| {
                    black_box(());
                });
            }
            pool.wait_all();
        });
    });
}

criterion_group!(benches, bench_thread_counts, bench_block_sizes, bench_pool_overhead);
criterion_main!(benches);
