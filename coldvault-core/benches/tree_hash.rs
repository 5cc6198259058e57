//! Tree hash throughput benchmarks

use coldvault_core::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

fn benchmark_hash_part(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_part");
    group.measurement_time(Duration::from_secs(10));

    for mib in &[1usize, 4, 16] {
        let body = vec![42u8; mib * LEAF_SIZE];
        group.throughput(Throughput::Bytes(body.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(format!("{}MiB", mib)), mib, |b, _| {
            b.iter(|| hash_part(&Sha256Hasher, black_box(&body)));
        });
    }
    group.finish();
}

fn benchmark_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine");

    for count in &[3usize, 100, MAX_PARTS as usize] {
        let leaves: Vec<TreeHash> = (0..*count)
            .map(|i| Sha256Hasher.hash(&(i as u64).to_le_bytes()))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| combine(&Sha256Hasher, black_box(&leaves)).unwrap());
        });
    }
    group.finish();
}

fn benchmark_plan(c: &mut Criterion) {
    c.bench_function("plan_40_tib", |b| {
        b.iter(|| ArchivePlan::for_size(black_box(40 * 1024 * 1024 * 1024 * 1024)));
    });
}

criterion_group!(benches, benchmark_hash_part, benchmark_combine, benchmark_plan);
criterion_main!(benches);
