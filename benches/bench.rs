// Copyright (c) 2024-present, Andrew Werner
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::{collections::BTreeMap, hint::black_box};

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::{rng, seq::SliceRandom, RngCore};

use crossbeam_skiplist::SkipMap as CrossbeamSkipMap;
use index_skiplist::SkipList;

const COUNTS: [usize; 3] = [1_000, 10_000, 100_000];
const PROBABILITY: f64 = 0.5;

fn shuffled_keys(n: usize) -> Vec<u64> {
    let mut keys: Vec<u64> = (0..n as u64).collect();
    keys.shuffle(&mut rng());
    keys
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &COUNTS {
        group.bench_with_input(BenchmarkId::new("BTreeMap", n), &n, |b, &n| {
            let keys = shuffled_keys(n);
            b.iter(|| {
                let mut map = BTreeMap::new();
                for &k in &keys {
                    map.insert(k, k);
                }
            });
        });
        group.bench_with_input(BenchmarkId::new("CrossbeamSkipMap", n), &n, |b, &n| {
            let keys = shuffled_keys(n);
            b.iter(|| {
                let map = CrossbeamSkipMap::new();
                for &k in &keys {
                    map.insert(k, k);
                }
            });
        });
        group.bench_with_input(BenchmarkId::new("SkipList", n), &n, |b, &n| {
            let keys = shuffled_keys(n);
            b.iter(|| {
                let mut list = SkipList::new(PROBABILITY, rng().next_u32()).unwrap();
                for &k in &keys {
                    list.insert(k, k);
                }
            });
        });
    }
    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");
    for &n in &COUNTS {
        group.bench_with_input(BenchmarkId::new("BTreeMap", n), &n, |b, &n| {
            let map: BTreeMap<u64, u64> = shuffled_keys(n).into_iter().map(|k| (k, k)).collect();
            let mut r = rng();
            b.iter(|| {
                let k = r.next_u64() % n as u64;
                black_box(map.get(&k));
            });
        });
        group.bench_with_input(BenchmarkId::new("CrossbeamSkipMap", n), &n, |b, &n| {
            let map = CrossbeamSkipMap::new();
            for k in shuffled_keys(n) {
                map.insert(k, k);
            }
            let mut r = rng();
            b.iter(|| {
                let k = r.next_u64() % n as u64;
                black_box(map.get(&k));
            });
        });
        group.bench_with_input(BenchmarkId::new("SkipList", n), &n, |b, &n| {
            let mut list = SkipList::new(PROBABILITY, rng().next_u32()).unwrap();
            for k in shuffled_keys(n) {
                list.insert(k, k);
            }
            let mut r = rng();
            b.iter(|| {
                let k = r.next_u64() % n as u64;
                black_box(list.find_first(&k));
            });
        });
    }
    group.finish();
}

fn bench_iter(c: &mut Criterion) {
    let mut group = c.benchmark_group("iter");
    for &n in &COUNTS {
        group.bench_with_input(BenchmarkId::new("BTreeMap", n), &n, |b, &n| {
            let map: BTreeMap<u64, u64> = shuffled_keys(n).into_iter().map(|k| (k, k)).collect();
            b.iter(|| {
                map.iter().for_each(|v| {
                    black_box(v);
                });
            });
        });
        group.bench_with_input(BenchmarkId::new("CrossbeamSkipMap", n), &n, |b, &n| {
            let map = CrossbeamSkipMap::new();
            for k in shuffled_keys(n) {
                map.insert(k, k);
            }
            b.iter(|| {
                map.iter().for_each(|v| {
                    black_box(v);
                });
            });
        });
        group.bench_with_input(BenchmarkId::new("SkipList", n), &n, |b, &n| {
            let mut list = SkipList::new(PROBABILITY, rng().next_u32()).unwrap();
            for k in shuffled_keys(n) {
                list.insert(k, k);
            }
            b.iter(|| {
                list.iter().for_each(|v| {
                    black_box(v.value());
                });
            });
        });
    }
    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");
    for &n in &[1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("BTreeMap", n), &n, |b, &n| {
            let keys = shuffled_keys(n);
            b.iter_batched(
                || keys.iter().map(|&k| (k, k)).collect::<BTreeMap<_, _>>(),
                |mut map| {
                    for &k in &keys {
                        black_box(map.remove(&k));
                    }
                },
                BatchSize::LargeInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("SkipList", n), &n, |b, &n| {
            let keys = shuffled_keys(n);
            b.iter_batched(
                || {
                    let mut list = SkipList::new(PROBABILITY, rng().next_u32()).unwrap();
                    for &k in &keys {
                        list.insert(k, k);
                    }
                    list
                },
                |mut list| {
                    for &k in &keys {
                        let node = list.find_first(&k).unwrap();
                        black_box(list.remove(node).unwrap());
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_insert, bench_find, bench_iter, bench_remove
}
criterion_main!(benches);
