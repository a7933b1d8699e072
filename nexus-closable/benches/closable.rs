//! Criterion benchmarks for the closable queue.
//!
//! Compares nexus-closable against crossbeam-channel's bounded channel.

use std::hint::black_box;
use std::thread;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use crossbeam_channel::bounded;
use nexus_closable::ClosableQueue;

// ============================================================================
// Single-threaded latency
// ============================================================================

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");

    group.bench_function("closable/try_write_try_read", |b| {
        let queue = ClosableQueue::<u64>::new(1024);
        b.iter(|| {
            queue.try_write(black_box(42)).unwrap();
            black_box(queue.try_read().unwrap())
        });
    });

    group.bench_function("closable/write_read", |b| {
        let queue = ClosableQueue::<u64>::new(1024);
        b.iter(|| {
            queue.write(black_box(42)).unwrap();
            black_box(queue.read().unwrap())
        });
    });

    group.bench_function("crossbeam_bounded/send_recv", |b| {
        let (tx, rx) = bounded::<u64>(1024);
        b.iter(|| {
            tx.send(black_box(42)).unwrap();
            black_box(rx.recv().unwrap())
        });
    });

    group.bench_function("closable/snapshots", |b| {
        let queue = ClosableQueue::<u64>::new(1024);
        b.iter(|| black_box((queue.count(), queue.can_write())));
    });

    group.finish();
}

// ============================================================================
// Cross-thread MPMC throughput
// ============================================================================

const MESSAGES: u64 = 100_000;

fn run_closable(threads: usize) {
    let queue = ClosableQueue::<u64>::new(256);
    let per_producer = MESSAGES / threads as u64;

    let consumers: Vec<_> = (0..threads)
        .map(|_| {
            let queue = queue.clone();
            thread::spawn(move || queue.iter().count())
        })
        .collect();

    let producers: Vec<_> = (0..threads)
        .map(|_| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..per_producer {
                    queue.write(i).unwrap();
                }
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    queue.close();

    let received: usize = consumers.into_iter().map(|c| c.join().unwrap()).sum();
    assert_eq!(received as u64, per_producer * threads as u64);
}

fn run_crossbeam(threads: usize) {
    let (tx, rx) = bounded::<u64>(256);
    let per_producer = MESSAGES / threads as u64;

    let consumers: Vec<_> = (0..threads)
        .map(|_| {
            let rx = rx.clone();
            thread::spawn(move || rx.iter().count())
        })
        .collect();
    drop(rx);

    let producers: Vec<_> = (0..threads)
        .map(|_| {
            let tx = tx.clone();
            thread::spawn(move || {
                for i in 0..per_producer {
                    tx.send(i).unwrap();
                }
            })
        })
        .collect();
    drop(tx);

    for p in producers {
        p.join().unwrap();
    }

    let received: usize = consumers.into_iter().map(|c| c.join().unwrap()).sum();
    assert_eq!(received as u64, per_producer * threads as u64);
}

fn bench_mpmc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc");
    group.throughput(Throughput::Elements(MESSAGES));
    group.sample_size(20);

    for threads in [1usize, 2, 4] {
        group.bench_with_input(BenchmarkId::new("closable", threads), &threads, |b, &t| {
            b.iter(|| run_closable(t));
        });
        group.bench_with_input(
            BenchmarkId::new("crossbeam_bounded", threads),
            &threads,
            |b, &t| {
                b.iter(|| run_crossbeam(t));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_mpmc);
criterion_main!(benches);
