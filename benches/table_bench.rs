use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use probe_chain_table::ProbeChainTable;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_put_distinct_100k(c: &mut Criterion) {
    c.bench_function("table::put_distinct_100k", |b| {
        b.iter_batched(
            ProbeChainTable::<String, u64>::new,
            |mut t| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    t.put(key(x), i as u64);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

// 1k keys with 16 values each: chain appends walk to the tail.
fn bench_put_repeated_16k(c: &mut Criterion) {
    let keys: Vec<String> = lcg(2).take(1_000).map(key).collect();
    c.bench_function("table::put_repeated_1k_x16", |b| {
        b.iter_batched(
            ProbeChainTable::<String, u64>::new,
            |mut t| {
                for round in 0..16u64 {
                    for k in &keys {
                        t.put(k.clone(), round);
                    }
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_contains_hit_miss(c: &mut Criterion) {
    let mut t = ProbeChainTable::new();
    let hits: Vec<String> = lcg(3).take(100_000).map(key).collect();
    for (i, k) in hits.iter().enumerate() {
        t.put(k.clone(), i as u64);
    }
    let misses: Vec<String> = lcg(4).take(100_000).map(key).collect();

    c.bench_function("table::contains_hit_100k", |b| {
        b.iter(|| {
            let mut n = 0usize;
            for k in &hits {
                n += t.contains_key(k) as usize;
            }
            black_box(n)
        })
    });
    c.bench_function("table::contains_miss_100k", |b| {
        b.iter(|| {
            let mut n = 0usize;
            for k in &misses {
                n += t.contains_key(k) as usize;
            }
            black_box(n)
        })
    });
}

fn bench_remove_10k(c: &mut Criterion) {
    c.bench_function("table::remove_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let mut t = ProbeChainTable::new();
                let keys: Vec<String> = lcg(5).take(110_000).map(key).collect();
                for (i, k) in keys.iter().enumerate() {
                    t.put(k.clone(), i as u64);
                }
                (t, keys)
            },
            |(mut t, keys)| {
                for k in keys.iter().step_by(11) {
                    black_box(t.remove(k));
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_values_100k(c: &mut Criterion) {
    let mut t = ProbeChainTable::new();
    for (i, x) in lcg(6).take(100_000).enumerate() {
        t.put(key(x % 25_000), i as u64);
    }
    c.bench_function("table::values_sum_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for v in t.values() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_put_distinct_100k,
        bench_put_repeated_16k,
        bench_contains_hit_miss,
        bench_remove_10k,
        bench_values_100k
}
criterion_main!(benches);
