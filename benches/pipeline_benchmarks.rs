//! Performance benchmarks for Framescope
//!
//! The sampler runs once per display refresh, so per-tick cost and
//! aggregation over a full buffer are the hot paths.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use framescope::{
    replay_durations, BenchmarkReport, BenchmarkSession, FrameSampler, FramescopeConfig, ManualScheduler,
    MetricsAggregator, RegressionAnalyzer, RunCapture,
};

fn trace(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| match i % 47 {
            0 => 120.0,
            13 => 55.0,
            29 => 30.0,
            _ => 16.7,
        })
        .collect()
}

/// Benchmark single-tick cost of a running sampler
fn bench_sampler_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampler_tick");

    for every_n in [1u32, 4] {
        group.bench_function(format!("tick_every_{}", every_n), |b| {
            let mut config = FramescopeConfig::default();
            config.sampler.sample_every_n = every_n;
            let mut sampler = FrameSampler::from_config(&config);
            let mut scheduler = ManualScheduler::new();
            sampler.start(&mut scheduler);
            let mut timestamp = 0.0;

            b.iter(|| {
                timestamp += 16.7;
                if let Some(handle) = scheduler.take_pending() {
                    black_box(sampler.on_tick(&mut scheduler, handle, timestamp));
                }
            });
        });
    }

    group.finish();
}

/// Benchmark replay + aggregation of whole traces
fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");

    for len in [60usize, 300, 3000] {
        let durations = trace(len);
        group.bench_function(format!("replay_{}_frames", len), |b| {
            b.iter_batched(
                FrameSampler::default,
                |mut sampler| black_box(replay_durations(&mut sampler, &durations)),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark snapshot aggregation over a full buffer
fn bench_aggregate(c: &mut Criterion) {
    let mut sampler = FrameSampler::default();
    replay_durations(&mut sampler, &trace(300));
    let aggregator = MetricsAggregator::default();

    c.bench_function("aggregate_full_buffer", |b| {
        b.iter(|| black_box(aggregator.aggregate(sampler.samples())));
    });
}

/// Benchmark report construction and rendering
fn bench_report(c: &mut Criterion) {
    let mut session = BenchmarkSession::new();
    for subject in ["modal", "bottom-sheet", "drawer"] {
        for run in 0..5 {
            let mut sampler = FrameSampler::default();
            let metrics = replay_durations(&mut sampler, &trace(200 + run * 10));
            session.record(subject, metrics, RunCapture::default());
        }
    }
    let analyzer = RegressionAnalyzer::default();

    c.bench_function("report_markdown", |b| {
        b.iter(|| {
            let report = BenchmarkReport::from_session("bench", &session, &analyzer);
            black_box(report.to_markdown())
        });
    });
}

criterion_group!(benches, bench_sampler_tick, bench_replay, bench_aggregate, bench_report);
criterion_main!(benches);
