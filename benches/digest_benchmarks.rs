//! Digest and aggregation benchmarks
//!
//! A 100k-generation run produces one telemetry line per generation plus
//! progress noise; these measure the filter and parser over logs of that
//! shape.
//!
//! Run with: cargo bench --bench digest_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use runlog_digest::digest::retain_telemetry_lines;
use runlog_digest::telemetry::parse_record;
use runlog_digest::trajectory::Trajectory;

/// Raw log with one noise line between telemetry lines
fn create_raw_log(generations: usize) -> String {
    let mut log = String::with_capacity(generations * 48);
    for generation in 0..generations {
        let best = 3000 - (generation * 2900 / generations.max(1));
        log.push_str(&format!("i={generation:3}   t=0.50   d_cost=-12   cost={best:5}\n"));
        log.push_str(&format!("@best={best}|gen={generation}|avg={}\n", best + 40));
    }
    log
}

/// Benchmark the telemetry filter
fn bench_retain(c: &mut Criterion) {
    let mut group = c.benchmark_group("retain_telemetry_lines");

    for size in [1_000, 10_000, 100_000].iter() {
        let log = create_raw_log(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &log, |b, log| {
            b.iter(|| {
                let mut out = Vec::with_capacity(log.len());
                let stats = retain_telemetry_lines(black_box(log.as_bytes()), &mut out).unwrap();
                black_box(stats);
            });
        });
    }

    group.finish();
}

/// Benchmark single-line parsing
fn bench_parse_record(c: &mut Criterion) {
    let line = "@best=137|gen=42|avg=190|worst=2211";
    c.bench_function("parse_record", |b| {
        b.iter(|| parse_record(black_box(line)).unwrap());
    });
}

/// Benchmark trajectory aggregation over already digested lines
fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("trajectory_from_lines");

    for size in [1_000, 10_000, 100_000].iter() {
        let log = create_raw_log(*size);
        let lines: Vec<&str> = log.lines().filter(|l| l.starts_with('@')).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &lines, |b, lines| {
            b.iter(|| {
                let trajectory = Trajectory::from_lines(black_box(lines.iter())).unwrap();
                black_box(trajectory);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_retain, bench_parse_record, bench_aggregate);
criterion_main!(benches);
