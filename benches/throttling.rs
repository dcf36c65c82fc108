use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nursery_guard::{band_for, recipient_hash, RateLimiter, WindowMode};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Benchmark age band lookup
fn bench_band_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("band_lookup");
    group.throughput(Throughput::Elements(200));

    group.bench_function("band_for_0_to_199", |b| {
        b.iter(|| {
            for months in 0..200u32 {
                black_box(band_for(black_box(months)));
            }
        })
    });

    group.finish();
}

/// Benchmark single-threaded check-and-consume on one hot key and on many keys
fn bench_single_threaded(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_threaded");
    group.throughput(Throughput::Elements(1000));

    for mode in [WindowMode::Rolling, WindowMode::Fixed] {
        group.bench_with_input(
            BenchmarkId::new("hot_key", format!("{:?}", mode)),
            &mode,
            |b, &mode| {
                let limiter = RateLimiter::builder()
                    .with_limit(100)
                    .with_window(Duration::from_secs(60))
                    .with_window_mode(mode)
                    .build()
                    .unwrap();

                b.iter(|| {
                    for _ in 0..1000 {
                        black_box(limiter.check_and_consume(black_box("reset_jane@example.com")));
                    }
                })
            },
        );
    }

    group.bench_function("distinct_keys", |b| {
        let limiter = RateLimiter::new();
        let keys: Vec<String> = (0..1000)
            .map(|i| format!("reset_user{}@example.com", i))
            .collect();

        b.iter(|| {
            for key in &keys {
                black_box(limiter.check_and_consume(black_box(key)));
            }
        })
    });

    group.finish();
}

/// Benchmark contention across threads
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for thread_count in [2, 4, 8] {
        group.throughput(Throughput::Elements(thread_count as u64 * 1000));

        group.bench_with_input(
            BenchmarkId::new("shared_key", thread_count),
            &thread_count,
            |b, &thread_count| {
                let limiter = Arc::new(RateLimiter::new());

                b.iter(|| {
                    let handles: Vec<_> = (0..thread_count)
                        .map(|_| {
                            let limiter = Arc::clone(&limiter);
                            thread::spawn(move || {
                                for _ in 0..1000 {
                                    black_box(limiter.check_and_consume("magic_jane@example.com"));
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                })
            },
        );
    }

    group.finish();
}

/// Benchmark the log-safe recipient hash
fn bench_recipient_hash(c: &mut Criterion) {
    c.bench_function("recipient_hash", |b| {
        b.iter(|| recipient_hash(black_box("  Jane.Doe+kids@Example.com ")))
    });
}

criterion_group!(
    benches,
    bench_band_lookup,
    bench_single_threaded,
    bench_concurrent,
    bench_recipient_hash
);
criterion_main!(benches);
