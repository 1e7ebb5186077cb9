use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use elastic_pool::{Config as PoolConfig, ThreadPool};
use std::{
    hint::black_box,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

fn wait_for(counter: &AtomicUsize, target: usize) {
    while counter.load(Ordering::Acquire) < target {
        thread::yield_now();
    }
}

// Benchmark 1: submit + execute overhead
fn bench_submit_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_overhead");

    for size in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("execute", size), &size, |b, &size| {
            let pool = ThreadPool::with_config(PoolConfig::cpu_bound()).unwrap();
            let done = Arc::new(AtomicUsize::new(0));

            b.iter(|| {
                done.store(0, Ordering::Release);
                for i in 0..size {
                    let done = done.clone();
                    pool.execute(move || {
                        black_box(i);
                        done.fetch_add(1, Ordering::AcqRel);
                    })
                    .unwrap();
                }
                wait_for(&done, size);
            });

            pool.destroy();
        });

        group.bench_with_input(BenchmarkId::new("submit_fn_arg", size), &size, |b, &size| {
            static DONE: AtomicUsize = AtomicUsize::new(0);

            fn entry(arg: &mut Box<u64>) {
                black_box(**arg);
                DONE.fetch_add(1, Ordering::AcqRel);
            }

            let pool = ThreadPool::with_config(PoolConfig::cpu_bound()).unwrap();

            b.iter(|| {
                DONE.store(0, Ordering::Release);
                for i in 0..size {
                    pool.submit(entry, Box::new(i as u64)).unwrap();
                }
                wait_for(&DONE, size);
            });

            pool.destroy();
        });

        group.bench_with_input(BenchmarkId::new("with_handle", size), &size, |b, &size| {
            let pool = ThreadPool::with_config(PoolConfig::cpu_bound()).unwrap();

            b.iter(|| {
                let handles: Vec<_> = (0..size)
                    .map(|i| pool.submit_with_handle(move || black_box(i)))
                    .collect();
                for handle in handles {
                    black_box(handle.join().unwrap());
                }
            });

            pool.destroy();
        });
    }

    group.finish();
}

// Benchmark 2: small queue, producers held back by backpressure
fn bench_backpressure(c: &mut Criterion) {
    let mut group = c.benchmark_group("backpressure");

    for capacity in [1usize, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            let config = PoolConfig::new(2, 8, capacity).with_monitor_interval(Duration::from_millis(50));
            let pool = ThreadPool::with_config(config).unwrap();
            let done = Arc::new(AtomicUsize::new(0));

            b.iter(|| {
                done.store(0, Ordering::Release);
                for _ in 0..2_000 {
                    let done = done.clone();
                    pool.execute(move || {
                        done.fetch_add(1, Ordering::AcqRel);
                    })
                    .unwrap();
                }
                wait_for(&done, 2_000);
            });

            pool.destroy();
        });
    }

    group.finish();
}

criterion_group!(benches, bench_submit_overhead, bench_backpressure);
criterion_main!(benches);
