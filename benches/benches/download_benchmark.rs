//! Benchmarks for the hot paths of a download.
//!
//! Run with: `cargo bench --package snapdl-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use snapdl_bench::{BenchmarkConfig, progress_transcript, run_lifecycle, write_fake_ytdlp};
use snapdl_lib::prelude::*;
use std::hint::black_box;
use std::time::Duration;
use tempfile::TempDir;

fn progress_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_progress");

    for lines in [100usize, 1_000] {
        let transcript = progress_transcript(lines);
        group.throughput(Throughput::Elements(transcript.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(lines),
            &transcript,
            |b, transcript| {
                b.iter(|| {
                    transcript
                        .iter()
                        .filter_map(|line| parse_progress(black_box(line)))
                        .count()
                });
            },
        );
    }

    group.finish();
}

fn sanitize_benchmark(c: &mut Criterion) {
    let titles = [
        "Rain Sounds for Sleeping | 10 Hours",
        "AC/DC - Back In Black (Official Video)",
        "  <Live> \"Encore\" at Madison Square Garden?  ",
        "日本語のタイトル: テスト*動画",
    ];

    c.bench_function("sanitize_title", |b| {
        b.iter(|| {
            for title in &titles {
                black_box(sanitize_title(black_box(title), "fallback"));
            }
        });
    });
}

fn resolve_benchmark(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("Clip.%(ext)s");
    // Last candidate, so every probe before it misses.
    std::fs::write(dir.path().join("Clip.m4a"), b"data").unwrap();

    c.bench_function("resolve_output", |b| {
        b.iter(|| resolve_output(black_box(&template)));
    });
}

fn lifecycle_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("lifecycle");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    for jobs in [1usize, 8] {
        let config = BenchmarkConfig {
            jobs,
            ..BenchmarkConfig::default()
        };
        group.throughput(Throughput::Elements(jobs as u64));
        group.bench_with_input(BenchmarkId::from_parameter(jobs), &config, |b, config| {
            b.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    let temp_dir = TempDir::new().unwrap();
                    let Ok(ytdlp) = write_fake_ytdlp(temp_dir.path(), config.progress_lines)
                    else {
                        return total;
                    };
                    let result = run_lifecycle(config, &ytdlp, temp_dir.path());
                    if result.success() {
                        total += result.duration;
                    }
                }
                total
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    progress_benchmark,
    sanitize_benchmark,
    resolve_benchmark,
    lifecycle_benchmark
);
criterion_main!(benches);
