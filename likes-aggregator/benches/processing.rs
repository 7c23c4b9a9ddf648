use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use likes_aggregator::config::build_processor;
use likes_aggregator::Settings;
use likes_aggregator_pipeline::processor::{ProcessVoteChanges, VoteChangeProcessor};
use likes_aggregator_shared::types::{VoteChange, VoteSnapshot};
use std::time::Duration;

fn processor() -> VoteChangeProcessor {
    let settings = Settings {
        database_url: String::new(),
        likes_root: "likes".to_string(),
        likes_daily_root: "likes_daily".to_string(),
        daily_likes_enabled: true,
        poll_interval: Duration::from_millis(500),
        change_batch_size: 100,
        max_concurrency: 16,
        tx_max_retries: 8,
        max_delivery_attempts: 10,
        delivery_lease: Duration::from_secs(30),
        database_max_connections: 1,
    };
    build_processor(&settings).unwrap()
}

/// Creates a batch of vote changes spread over both routes and every kind of transition
fn make_changes(count: usize) -> Vec<VoteChange> {
    (0..count)
        .map(|i| {
            let path = if i % 2 == 0 {
                format!("likes/dish-{}/votes/uid-{i}", i % 40)
            } else {
                format!("likes_daily/2025-03-{:02}/dish-{}/votes/uid-{i}", i % 28 + 1, i % 40)
            };
            let id = i as i64;
            match i % 4 {
                0 => VoteChange::created(id, path, VoteSnapshot::liked()),
                1 => VoteChange::updated(id, path, VoteSnapshot::liked(), VoteSnapshot::unliked()),
                2 => VoteChange::deleted(id, path, VoteSnapshot::liked()),
                _ => VoteChange::updated(id, path, VoteSnapshot::liked(), VoteSnapshot::liked()),
            }
        })
        .collect()
}

/// Benchmark processing a single vote change
fn single_change_processing(c: &mut Criterion) {
    let processor = processor();

    c.bench_function("process_single_change", |b| {
        b.iter_batched(
            || make_changes(1).remove(0),
            |change| processor.process(black_box(&change)),
            BatchSize::SmallInput,
        )
    });
}

/// Benchmark processing batches of vote changes
fn batch_processing(c: &mut Criterion) {
    let processor = processor();
    let mut group = c.benchmark_group("batch_processing");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(format!("batch_size_{}", size), size, |b, &size| {
            b.iter_batched(
                || make_changes(size),
                |changes| {
                    changes
                        .iter()
                        .map(|change| processor.process(black_box(change)).len())
                        .sum::<usize>()
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// Benchmark rejecting changes with malformed keys
fn invalid_change_processing(c: &mut Criterion) {
    let processor = processor();
    let long_key = "a".repeat(201);

    c.bench_function("process_invalid_change", |b| {
        b.iter_batched(
            || VoteChange::created(1, format!("likes/{long_key}/votes/uid-1"), VoteSnapshot::liked()),
            |change| processor.process(black_box(&change)),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    single_change_processing,
    batch_processing,
    invalid_change_processing,
);
criterion_main!(benches);
