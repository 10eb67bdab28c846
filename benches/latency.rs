//! Benchmark harness using Criterion for latency measurement.
//!
//! Measures:
//! - Add order (no match)
//! - Add order (full match through N resting orders)
//! - Cancel order
//! - Top-of-book and depth queries
//! - Mixed workload

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lob_engine::{BookConfig, ExchangeId, InstrumentId, Order, OrderBook, OrderId, Side};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn warm_book() -> OrderBook {
    let config = BookConfig {
        order_capacity: 100_000,
        warm_up: true,
    };
    OrderBook::with_config(InstrumentId::default(), ExchangeId::default(), config)
}

/// Generate a random limit order
fn random_order(rng: &mut ChaCha8Rng, order_id: OrderId) -> Order {
    Order::limit(
        order_id,
        if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
        rng.gen_range(9_900..10_100) * 100, // 990.00 to 1010.00
        rng.gen_range(1..1000),
    )
}

/// Benchmark: Add order that rests (no matching)
fn bench_add_no_match(c: &mut Criterion) {
    let mut book = warm_book();
    let mut order_id = 0u64;

    c.bench_function("add_no_match", |b| {
        b.iter(|| {
            order_id += 1;
            black_box(book.add(Order::limit(order_id, Side::Buy, 9_000 + order_id % 50, 100)))
        })
    });
}

/// Benchmark: Add order that fully matches `depth` resting orders
fn bench_add_full_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_full_match");

    for depth in [1u32, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let mut book = warm_book();
            let mut next_id = 0u64;
            let rest = |book: &mut OrderBook, next_id: &mut u64| {
                for _ in 0..depth {
                    *next_id += 1;
                    let _ = book.add(Order::limit(*next_id, Side::Sell, 10_000, 100));
                }
            };
            rest(&mut book, &mut next_id);

            b.iter(|| {
                next_id += 1;
                let result = book.add(Order::limit(next_id, Side::Buy, 10_000, 100 * depth));
                // Replenish the matched orders
                rest(&mut book, &mut next_id);
                black_box(result)
            })
        });
    }

    group.finish();
}

/// Benchmark: Cancel order
fn bench_cancel(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel");

    for book_size in [100u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(book_size), &book_size, |b, &book_size| {
            let mut book = warm_book();
            let price_of = |i: u64| 9_000 + (i % 100) * 10;

            for i in 0..book_size {
                let _ = book.add(Order::limit(i, Side::Buy, price_of(i), 100));
            }

            let mut cancel_id = 0u64;
            let mut next_order_id = book_size;

            b.iter(|| {
                let result = book.cancel_id(cancel_id);
                // Replenish
                let _ = book.add(Order::limit(next_order_id, Side::Buy, price_of(cancel_id), 100));
                cancel_id = next_order_id;
                next_order_id += 1;
                black_box(result)
            })
        });
    }

    group.finish();
}

/// Benchmark: Read-only queries on a deep book
fn bench_queries(c: &mut Criterion) {
    let mut book = warm_book();
    let mut rng = ChaCha8Rng::seed_from_u64(0xFACE);
    for id in 0..10_000 {
        let _ = book.add(random_order(&mut rng, id));
    }

    c.bench_function("top_of_book", |b| b.iter(|| black_box(book.top_of_book())));
    c.bench_function("levels_10", |b| b.iter(|| black_box(book.levels(10))));
}

/// Benchmark: Mixed workload (70% add, 30% cancel)
fn bench_mixed_workload(c: &mut Criterion) {
    c.bench_function("mixed_70_add_30_cancel", |b| {
        let mut book = warm_book();
        let mut rng = ChaCha8Rng::seed_from_u64(0xDEADBEEF);
        let mut order_id = 0u64;

        for _ in 0..1000 {
            order_id += 1;
            let _ = book.add(random_order(&mut rng, order_id));
        }

        b.iter(|| {
            if rng.gen_bool(0.7) {
                order_id += 1;
                let _ = black_box(book.add(random_order(&mut rng, order_id)));
            } else {
                let cancel_id = rng.gen_range(1..=order_id);
                let _ = black_box(book.cancel_id(cancel_id));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_add_no_match,
    bench_add_full_match,
    bench_cancel,
    bench_queries,
    bench_mixed_workload,
);

criterion_main!(benches);
