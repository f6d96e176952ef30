use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_decimal_macros::dec;

use readyrs::acwr::AcwrCalculator;
use readyrs::models::{CompletedSet, ExerciseCategory};

/// Performance benchmarks for the readiness engine
///
/// These benchmarks test volume aggregation and metric calculation with
/// varying history sizes to ensure the scorer stays cheap on large logs.

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 28, 12, 0, 0).unwrap()
}

fn create_set_history(sets_per_day: usize, days: i64) -> Vec<CompletedSet> {
    let now = fixed_now();
    let mut sets = Vec::with_capacity(sets_per_day * days as usize);

    for day in 0..days {
        for n in 0..sets_per_day {
            sets.push(CompletedSet {
                id: format!("set_{}_{}", day, n),
                exercise_name: "Back Squat".to_string(),
                exercise_category: Some(ExerciseCategory::Strength),
                completed_at: now - Duration::days(day) - Duration::minutes(n as i64 * 3),
                reps: 5 + (n % 6) as u16,
                weight: dec!(60) + rust_decimal::Decimal::from(n * 5),
                perceived_exertion: None,
                notes: None,
                source: None,
            });
        }
    }

    sets
}

fn bench_daily_aggregation(c: &mut Criterion) {
    let calculator = AcwrCalculator::new();
    let mut group = c.benchmark_group("Daily Volume Aggregation");

    for &sets_per_day in &[5usize, 20, 50] {
        let sets = create_set_history(sets_per_day, 28);

        group.throughput(Throughput::Elements(sets.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("aggregate_daily_volume", sets.len()),
            &sets,
            |b, sets| {
                b.iter(|| calculator.aggregate_daily_volume(black_box(sets)));
            },
        );
    }

    group.finish();
}

fn bench_acwr_metrics(c: &mut Criterion) {
    let calculator = AcwrCalculator::new();
    let mut group = c.benchmark_group("ACWR Metrics");

    for &days in &[28i64, 90, 365] {
        let sets = create_set_history(10, days);
        let daily = calculator.aggregate_daily_volume(&sets);

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(
            BenchmarkId::new("metrics_at", days),
            &daily,
            |b, daily| {
                b.iter(|| calculator.metrics_at(black_box(daily), fixed_now()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_daily_aggregation, bench_acwr_metrics);
criterion_main!(benches);
