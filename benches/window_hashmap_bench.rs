use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;
use window_hashmap::WindowHashMap;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("window::insert_fresh_100k", |b| {
        b.iter_batched(
            WindowHashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    let _ = m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_pregrown_100k(c: &mut Criterion) {
    c.bench_function("window::insert_pregrown_100k", |b| {
        b.iter_batched(
            || {
                // Grow the bucket table first, then empty the map so the
                // measured inserts never rebuild.
                let mut m = WindowHashMap::new();
                for (i, x) in lcg(2).take(110_000).enumerate() {
                    let _ = m.insert(key(x), i as u64);
                }
                m.clear();
                m
            },
            |mut m| {
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    let _ = m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_erase_random_10k(c: &mut Criterion) {
    c.bench_function("window::erase_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let mut m = WindowHashMap::new();
                let keys: Vec<String> = lcg(5).take(110_000).map(key).collect();
                for (i, k) in keys.iter().enumerate() {
                    let _ = m.insert(k.clone(), i as u64);
                }
                // Precompute 10k unique victims via LCG
                let n = keys.len();
                let mut sel = std::collections::HashSet::with_capacity(10_000);
                let mut s = 0x9e3779b97f4a7c15u64;
                while sel.len() < 10_000 {
                    s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                    sel.insert((s as usize) % n);
                }
                let victims: Vec<String> = sel.into_iter().map(|i| keys[i].clone()).collect();
                (m, victims)
            },
            |(mut m, victims)| {
                for k in &victims {
                    m.erase(k.as_str());
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    c.bench_function("window::find_hit_10k_on_100k", |b| {
        let mut m = WindowHashMap::new();
        let keys: Vec<_> = lcg(7).take(100_000).map(key).collect();
        for (i, k) in keys.iter().enumerate() {
            let _ = m.insert(k.clone(), i as u64);
        }
        // Precompute 10k random query keys using LCG
        let n = keys.len();
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<String> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % n].clone()
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(m.find(k.as_str()));
            }
        })
    });
}

fn bench_find_miss_10k(c: &mut Criterion) {
    c.bench_function("window::find_miss_10k_on_100k", |b| {
        let mut m = WindowHashMap::new();
        for (i, x) in lcg(11).take(100_000).enumerate() {
            let _ = m.insert(key(x), i as u64);
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next().unwrap());
                black_box(m.find(k.as_str()));
            }
        })
    });
}

fn bench_get_or_insert_default_10k(c: &mut Criterion) {
    c.bench_function("window::get_or_insert_default_10k_half_hits", |b| {
        b.iter_batched(
            || {
                let mut m: WindowHashMap<String, u64> = WindowHashMap::new();
                for (i, x) in lcg(17).take(5_000).enumerate() {
                    let _ = m.insert(key(x), i as u64);
                }
                let touch: Vec<String> = lcg(17).take(10_000).map(key).collect();
                (m, touch)
            },
            |(mut m, touch)| {
                for k in touch {
                    *m.get_or_insert_default(k) += 1;
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iter_and_iter_mut(c: &mut Criterion) {
    c.bench_function("window::iter_all_100k", |b| {
        let mut m = WindowHashMap::new();
        for (i, x) in lcg(999).take(100_000).enumerate() {
            let _ = m.insert(key(x), i as u64);
        }
        b.iter(|| {
            let mut sum = 0u64;
            for (_p, _k, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });

    c.bench_function("window::iter_mut_increment_all_100k", |b| {
        b.iter_batched(
            || {
                let mut m = WindowHashMap::new();
                for (i, x) in lcg(1001).take(100_000).enumerate() {
                    let _ = m.insert(key(x), i as u64);
                }
                m
            },
            |mut m| {
                for (_p, _k, v) in m.iter_mut() {
                    *v = v.wrapping_add(1);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_fresh_100k, bench_insert_pregrown_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_erase_random_10k,
              bench_find_hit_10k,
              bench_find_miss_10k,
              bench_get_or_insert_default_10k,
              bench_iter_and_iter_mut
}
criterion_main!(benches_insert, benches_ops);
