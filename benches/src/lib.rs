//! Benchmark utilities for snapdl.
//!
//! The lifecycle benchmarks drive the real [`DownloadManager`] against a
//! shell script that behaves like `yt-dlp`: it prints progress lines and
//! writes an artifact next to the output template.

use snapdl_lib::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Result of a single lifecycle run.
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    /// Label of the run.
    pub label: String,
    /// Time from the first job submission to the last terminal event.
    pub duration: Duration,
    /// Number of jobs submitted.
    pub jobs: usize,
    /// Number of jobs that completed.
    pub completed: usize,
    /// Number of progress events observed.
    pub progress_events: u64,
    /// Error message if the run could not finish.
    pub error: Option<String>,
}

impl BenchmarkResult {
    /// Whether every submitted job completed.
    pub fn success(&self) -> bool {
        self.error.is_none() && self.completed == self.jobs
    }

    /// Completed jobs per second.
    pub fn jobs_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Configuration for a lifecycle run.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of jobs submitted at once.
    pub jobs: usize,
    /// Progress lines the fake tool prints per job.
    pub progress_lines: usize,
    /// Request audio-only downloads.
    pub audio: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            jobs: 4,
            progress_lines: 20,
            audio: false,
        }
    }
}

/// Builds a `yt-dlp`-like transcript with `lines` progress lines.
pub fn progress_transcript(lines: usize) -> Vec<String> {
    let mut transcript = vec![
        "[youtube] Extracting URL: https://www.youtube.com/watch?v=bench".to_string(),
        "[info] bench: Downloading 1 format(s): 22".to_string(),
        "[download] Destination: /tmp/Bench.mp4".to_string(),
    ];
    let step = 100.0 / lines.max(1) as f64;
    transcript.extend((1..=lines).map(|i| {
        format!(
            "[download] {:>5.1}% of   48.31MiB at    3.12MiB/s ETA 00:{:02}",
            step * i as f64,
            lines - i
        )
    }));
    transcript.push("[download] 100% of   48.31MiB in 00:00:15".to_string());
    transcript
}

/// Writes a fake `yt-dlp` into `dir`.
///
/// The script prints `progress_lines` progress lines, then creates
/// `<template with ext=mp4>` and exits 0.
#[cfg(unix)]
pub fn write_fake_ytdlp(dir: &Path, progress_lines: usize) -> io::Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let step = 100 / progress_lines.max(1);
    let script = format!(
        r#"#!/bin/sh
for a; do template="$out"; out="$a"; done
i=1
while [ $i -le {progress_lines} ]; do
  echo "[download]  $((i * {step})).0% of 10.00MiB at 1.00MiB/s ETA 00:01"
  i=$((i + 1))
done
file=$(printf '%s' "$template" | sed 's/%(ext)s/mp4/')
echo data > "$file"
"#
    );

    let path = dir.join("yt-dlp");
    std::fs::write(&path, script)?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// Writes a fake `yt-dlp` into `dir`.
#[cfg(not(unix))]
pub fn write_fake_ytdlp(_dir: &Path, _progress_lines: usize) -> io::Result<PathBuf> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "the fake yt-dlp is a POSIX shell script",
    ))
}

/// Submits `config.jobs` jobs to a fresh manager and waits for all of them.
pub fn run_lifecycle(config: &BenchmarkConfig, ytdlp: &Path, work_dir: &Path) -> BenchmarkResult {
    let mut result = BenchmarkResult {
        label: format!("{} jobs x {} lines", config.jobs, config.progress_lines),
        duration: Duration::ZERO,
        jobs: config.jobs,
        completed: 0,
        progress_events: 0,
        error: None,
    };

    let manager_config = ManagerConfig::default()
        .with_ytdlp(ytdlp)
        .with_base_dir(work_dir)
        .with_download_dir(work_dir.join("downloads"))
        .with_temp_dir(work_dir.join("temp"));
    let (observer, mut events) = ChannelObserver::channel();
    let manager = match DownloadManager::new(manager_config, observer) {
        Ok(manager) => manager,
        Err(e) => {
            result.error = Some(e.to_string());
            return result;
        }
    };

    let start = Instant::now();
    for i in 0..config.jobs {
        let request = DownloadRequest::new(format!("https://example.com/v/{i}"), format!("Bench {i}"))
            .audio_only(config.audio);
        if let Err(e) = manager.create_job(request) {
            result.error = Some(e.to_string());
            return result;
        }
    }

    let mut settled = 0;
    while settled < config.jobs {
        let Some(event) = events.blocking_recv() else {
            result.error = Some("event channel closed".to_string());
            break;
        };
        match event.kind() {
            EventKind::Progress => result.progress_events += 1,
            EventKind::Complete => {
                result.completed += 1;
                settled += 1;
            }
            EventKind::Error => settled += 1,
            EventKind::Status => {}
        }
    }
    result.duration = start.elapsed();
    result
}

/// Format duration for display.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Finds a real `yt-dlp` on `PATH`, if any.
pub fn find_ytdlp() -> Option<PathBuf> {
    which::which("yt-dlp").ok()
}
