//! Benchmark runner that outputs a markdown table for the README.
//!
//! Run with: `cargo run --package snapdl-bench --bin lifecycle_table --release`
//!
//! Jobs run against a fake `yt-dlp`, so the numbers measure the manager's
//! own overhead: process spawning, progress parsing and event delivery.

use snapdl_bench::{
    BenchmarkConfig, BenchmarkResult, find_ytdlp, format_duration, run_lifecycle,
    write_fake_ytdlp,
};
use snapdl_lib::tool_version;
use std::io::Write;
use std::time::Duration;

/// Number of iterations per benchmark for statistical significance.
const ITERATIONS: usize = 3;

fn main() {
    println!("snapdl Job Lifecycle Benchmark");
    println!("==============================\n");

    let configs = [
        BenchmarkConfig {
            jobs: 1,
            progress_lines: 20,
            audio: false,
        },
        BenchmarkConfig {
            jobs: 8,
            progress_lines: 20,
            audio: false,
        },
        BenchmarkConfig {
            jobs: 32,
            progress_lines: 100,
            audio: true,
        },
    ];

    println!("Running benchmarks ({} iterations each)...\n", ITERATIONS);

    let mut results: Vec<Vec<BenchmarkResult>> = Vec::new();
    for config in &configs {
        print!("Benchmarking {} jobs... ", config.jobs);
        let _ = std::io::stdout().flush();

        let mut runs = Vec::new();
        for i in 0..ITERATIONS {
            let temp_dir = match tempfile::TempDir::new() {
                Ok(dir) => dir,
                Err(e) => {
                    eprintln!("Error: failed to create a temp dir: {e}");
                    std::process::exit(1);
                }
            };
            let ytdlp = match write_fake_ytdlp(temp_dir.path(), config.progress_lines) {
                Ok(path) => path,
                Err(e) => {
                    eprintln!("Error: failed to write the fake yt-dlp: {e}");
                    std::process::exit(1);
                }
            };
            runs.push(run_lifecycle(config, &ytdlp, temp_dir.path()));
            print!("R{} ", i + 1);
            let _ = std::io::stdout().flush();
        }
        results.push(runs);
        println!("done");
    }

    println!("\n## Results\n");
    println!("| Run | Duration | Jobs/s | Progress events |");
    println!("|-----|----------|--------|-----------------|");

    for runs in &results {
        let Some(first) = runs.first() else { continue };
        let successful: Vec<_> = runs.iter().filter(|r| r.success()).collect();
        if successful.is_empty() {
            println!(
                "| {} | FAILED | - | {} |",
                first.label,
                first.error.as_deref().unwrap_or("jobs failed")
            );
            continue;
        }

        let avg = Duration::from_secs_f64(
            successful.iter().map(|r| r.duration.as_secs_f64()).sum::<f64>()
                / successful.len() as f64,
        );
        let jobs_per_sec =
            successful.iter().map(|r| r.jobs_per_sec()).sum::<f64>() / successful.len() as f64;

        println!(
            "| {} | {} | {:.1} | {} |",
            first.label,
            format_duration(avg),
            jobs_per_sec,
            first.progress_events
        );
    }

    println!("\n### Environment\n");
    println!("- OS: {}", std::env::consts::OS);
    println!("- Arch: {}", std::env::consts::ARCH);
    println!(
        "- yt-dlp on PATH: {}",
        find_ytdlp()
            .and_then(|path| tool_version(&path))
            .unwrap_or_else(|| "not found".to_string())
    );
}
