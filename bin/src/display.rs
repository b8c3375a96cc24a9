//! Display utilities and output formatting for the snapdl CLI.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use snapdl_lib::prelude::*;
use std::collections::HashMap;

/// Width of the title column in front of each bar.
const TITLE_WIDTH: usize = 24;

/// One progress bar per download job.
#[derive(Debug)]
pub(crate) struct JobBars {
    multi: MultiProgress,
    bars: HashMap<JobId, ProgressBar>,
}

impl JobBars {
    /// Creates an empty set of bars, drawing nothing in quiet mode.
    pub(crate) fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self {
            multi,
            bars: HashMap::new(),
        }
    }

    /// Adds a bar for a job.
    pub(crate) fn add(&mut self, id: JobId, title: &str) {
        let pb = self.multi.add(ProgressBar::new(100));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.bold} [{bar:30.cyan/blue}] {percent:>3}% {msg}")
                .expect("Invalid progress template")
                .progress_chars("=>-"),
        );
        pb.set_prefix(format!("{:<TITLE_WIDTH$}", short_title(title, TITLE_WIDTH)));
        pb.set_message("queued");
        self.bars.insert(id, pb);
    }

    /// Updates the job's bar from a manager event.
    pub(crate) fn apply(&self, event: &JobEvent) {
        let job = event.job();
        let Some(pb) = self.bars.get(&job.id) else {
            return;
        };

        match event.kind() {
            EventKind::Progress => pb.set_position(percent_position(job.progress)),
            EventKind::Status if job.status == JobStatus::Downloading => {
                pb.set_position(percent_position(job.progress));
                pb.set_message("downloading");
            }
            EventKind::Status if job.status.is_settled() => {
                pb.abandon_with_message(job.status.to_string());
            }
            EventKind::Status => pb.set_message(job.status.to_string()),
            EventKind::Complete => {
                let path = job
                    .final_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                pb.finish_with_message(path);
            }
            EventKind::Error => {
                pb.abandon_with_message(job.error_detail.clone().unwrap_or_default());
            }
        }
    }

    /// Leaves the job's bar where it is with a final message.
    pub(crate) fn abandon(&self, id: JobId, message: &str) {
        if let Some(pb) = self.bars.get(&id) {
            pb.abandon_with_message(message.to_string());
        }
    }
}

fn percent_position(progress: f64) -> u64 {
    progress.clamp(0.0, 100.0).round() as u64
}

/// Derives a title from a URL: its last non-empty path or query segment.
pub(crate) fn default_title(url: &str) -> String {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    let query = url.split_once('?').map(|(_, q)| q);

    // Video ids usually sit in the query, e.g. `watch?v=<id>`.
    let from_query = query.and_then(|q| {
        q.split('&')
            .find_map(|pair| pair.strip_prefix("v="))
            .filter(|id| !id.is_empty())
    });

    from_query
        .or_else(|| {
            trimmed
                .split(['/', '='])
                .rev()
                .find(|segment| !segment.is_empty() && !segment.contains(':'))
        })
        .map_or_else(|| url.to_string(), str::to_string)
}

/// Truncates a title to `width` characters, marking the cut with `~`.
pub(crate) fn short_title(title: &str, width: usize) -> String {
    if title.chars().count() <= width {
        return title.to_string();
    }
    let mut short: String = title.chars().take(width.saturating_sub(1)).collect();
    short.push('~');
    short
}

/// Prints one line per job with its outcome.
pub(crate) fn print_summary(jobs: &[DownloadJob]) {
    if jobs.is_empty() {
        return;
    }

    println!();
    println!("{:<TITLE_WIDTH$} {:<12} Result", "Title", "Status");
    println!("{}", "-".repeat(TITLE_WIDTH + 20));
    for job in jobs {
        let result = match job.status {
            JobStatus::Completed => job
                .final_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            JobStatus::Error => job.error_detail.clone().unwrap_or_default(),
            _ => format!("{:.0}%", job.progress),
        };
        println!(
            "{:<TITLE_WIDTH$} {:<12} {}",
            short_title(&job.title, TITLE_WIDTH),
            job.status,
            result
        );
    }

    let completed = jobs.iter().filter(|job| job.is_completed()).count();
    println!();
    println!("{} of {} downloads completed", completed, jobs.len());
}
