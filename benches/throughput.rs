//! Throughput of every tier the running CPU supports.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng as _, SeedableRng as _, rngs::StdRng};
use tiered_adler32::{Tier, update_and_copy};

const SIZES: [usize; 5] = [15, 64, 1024, 64 * 1024, 1024 * 1024];

fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0; len];
    StdRng::seed_from_u64(0xAD1E).fill(&mut data[..]);
    data
}

fn bench_tiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");

    for size in SIZES {
        let data = random_bytes(size);
        group.throughput(Throughput::Bytes(size as u64));

        for tier in Tier::available() {
            let Some(update) = tier.get_imp() else { continue };
            group.bench_with_input(BenchmarkId::new(tier.name(), size), &data, |b, data| {
                b.iter(|| update(1, black_box(data)));
            });
        }

        group.bench_with_input(BenchmarkId::new("adler", size), &data, |b, data| {
            b.iter(|| adler::adler32_slice(black_box(data)));
        });
    }

    group.finish();
}

fn bench_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_and_copy");

    for size in [1024, 64 * 1024] {
        let data = random_bytes(size);
        let mut dst = vec![0; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(BenchmarkId::new("fused", size), |b| {
            b.iter(|| update_and_copy(1, black_box(&data), &mut dst));
        });
        group.bench_function(BenchmarkId::new("copy_then_update", size), |b| {
            b.iter(|| {
                dst.copy_from_slice(black_box(&data));
                tiered_adler32::update(1, &dst)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tiers, bench_copy);
criterion_main!(benches);
