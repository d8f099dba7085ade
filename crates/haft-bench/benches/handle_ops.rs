//! Criterion micro-benchmarks for handle allocation, recency and lookup.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use haft_alloc::{HandleMap, HandleSet, KeyedHandleSet, LruHandleSet};
use haft_bench::{churn_script, distinct_keys, ChurnOp};

const HANDLES: usize = 4096;

fn bench_set_fill_drain(c: &mut Criterion) {
    let mut set = HandleSet::<u16>::new(HANDLES).unwrap();
    c.bench_function("set_fill_drain_4k", |b| {
        b.iter(|| {
            while let Some(h) = set.alloc() {
                black_box(h);
            }
            set.reset();
        });
    });
}

fn bench_set_churn(c: &mut Criterion) {
    let script = churn_script(100_000, HANDLES, HANDLES * 3 / 4, 42);
    c.bench_function("set_churn_100k", |b| {
        b.iter_batched_ref(
            || HandleSet::<u16>::new(HANDLES).unwrap(),
            |set| {
                for &op in &script {
                    match op {
                        ChurnOp::Alloc => {
                            black_box(set.alloc());
                        }
                        ChurnOp::Free(pick) => {
                            let h = set.handles()[pick % set.len()];
                            set.free(h);
                        }
                    }
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_lru_touch(c: &mut Criterion) {
    let mut lru = LruHandleSet::<u16>::new(HANDLES).unwrap();
    while lru.alloc().is_some() {}
    let order: Vec<u16> = distinct_keys(HANDLES, 9)
        .into_iter()
        .map(|k| (k % HANDLES as u64) as u16)
        .collect();
    c.bench_function("lru_touch_4k", |b| {
        b.iter(|| {
            for &h in &order {
                lru.touch(h);
            }
            black_box(lru.back());
        });
    });
}

fn bench_map_find(c: &mut Criterion) {
    let keys = distinct_keys(HANDLES, 1);
    let mut map: HandleMap<u64, u16> = HandleMap::new(HANDLES + HANDLES / 2).unwrap();
    for (h, &k) in keys.iter().enumerate() {
        map.insert(k, h as u16).unwrap();
    }
    let misses = distinct_keys(HANDLES, 2);
    c.bench_function("map_find_hit_4k", |b| {
        b.iter(|| {
            for &k in &keys {
                black_box(map.find(k));
            }
        });
    });
    c.bench_function("map_find_miss_4k", |b| {
        b.iter(|| {
            for &k in &misses {
                black_box(map.find(k));
            }
        });
    });
}

fn bench_keyed_cycle(c: &mut Criterion) {
    let keys = distinct_keys(HANDLES, 5);
    let mut set: KeyedHandleSet<u64, u16> = KeyedHandleSet::new(HANDLES).unwrap();
    c.bench_function("keyed_alloc_free_4k", |b| {
        b.iter(|| {
            for &k in &keys {
                black_box(set.alloc(k).unwrap());
            }
            for &k in &keys {
                black_box(set.free_by_key(k));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_set_fill_drain,
    bench_set_churn,
    bench_lru_touch,
    bench_map_find,
    bench_keyed_cycle
);
criterion_main!(benches);
