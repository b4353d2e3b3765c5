use std::sync::{Arc, Barrier};
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use statebox::{CasBox, Container, LockBox, LockContainer, OrderedLock, RxLockBox};

const ITERATIONS: usize = 1_000;

fn contend<C>(container: &C, threads: usize)
where
    C: Container<u64> + Clone + Send + 'static,
{
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let container = container.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..ITERATIONS {
                    container.modify(|v| v.wrapping_add(1));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

fn modify_under_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("modify_under_contention");
    for threads in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("cas_box", threads), &threads, |b, &threads| {
            let cas = CasBox::of(0u64);
            b.iter(|| contend(&cas, threads));
        });
        group.bench_with_input(BenchmarkId::new("lock_box", threads), &threads, |b, &threads| {
            let lock_box = LockBox::of(0u64);
            b.iter(|| contend(&lock_box, threads));
        });
        group.bench_with_input(BenchmarkId::new("rx_lock_box", threads), &threads, |b, &threads| {
            let rx = RxLockBox::of(0u64);
            b.iter(|| contend(&rx, threads));
        });
    }
    group.finish();
}

fn ordered_lock_take(c: &mut Criterion) {
    let boxes: Vec<LockBox<u64>> = (0..8).map(|_| LockBox::of(0)).collect();
    let ordered = OrderedLock::on(boxes.iter().map(|lock_box| lock_box.lock().clone()));

    c.bench_function("ordered_lock_take_8", |b| {
        b.iter(|| {
            black_box(ordered.take_and_get(|| {
                boxes
                    .iter()
                    .map(|lock_box| lock_box.modify(|v| v.wrapping_add(1)))
                    .fold(0u64, u64::wrapping_add)
            }))
        });
    });
}

criterion_group!(benches, modify_under_contention, ordered_lock_take);
criterion_main!(benches);
