//! Backoff and event dispatch benchmarks.
//!
//! Run with: cargo bench --bench backoff
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use resilient_ws::{Callbacks, EventHandler, Payload, ReconnectOptions};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const ATTEMPTS: &[u32] = &[1, 10, 100, 1000];

// ============================================================================
// Benchmark: Delay Computation
// ============================================================================

fn bench_delay_for(c: &mut Criterion) {
    let options = ReconnectOptions::new()
        .with_base_interval(Duration::from_secs(1))
        .with_backoff_multiplier(1.5);

    let mut group = c.benchmark_group("delay_for");

    for &attempt in ATTEMPTS {
        group.bench_with_input(BenchmarkId::from_parameter(attempt), &attempt, |b, &n| {
            b.iter(|| options.delay_for(black_box(n)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Callback Dispatch
// ============================================================================

fn bench_callbacks(c: &mut Criterion) {
    let mut received = 0usize;
    let mut callbacks = Callbacks::new().on_message(move |payload| {
        received = received.wrapping_add(payload.len());
        black_box(received);
    });

    c.bench_function("callbacks_on_message", |b| {
        b.iter(|| callbacks.on_message(Payload::from(black_box("Message received [123]: hi"))));
    });
}

criterion_group!(benches, bench_delay_for, bench_callbacks);
criterion_main!(benches);
