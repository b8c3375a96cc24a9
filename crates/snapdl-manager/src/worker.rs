//! The per-job worker driving one `yt-dlp` run.

use crate::events::EventKind;
use crate::manager::Shared;
use crate::resolve::{relocate, resolve_output};
use crate::{ManagerError, Result};
use snapdl_process::{ToolCommand, parse_progress};
use snapdl_types::{DownloadJob, JobId};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// How the tool run ended, before the outcome is interpreted.
#[derive(Debug)]
enum RunEnd {
    Exited(ExitStatus),
    Failed(String),
    /// The job was paused, stopped or removed before the tool was attached.
    Abandoned,
}

/// Builds the `yt-dlp` command line for a job.
pub(crate) fn build_command(ytdlp: &Path, job: &DownloadJob) -> ToolCommand {
    let format: &[&str] = if job.only_audio {
        &["-f", "bestaudio", "-x", "--audio-format", "mp3", "--no-mtime"]
    } else {
        &["-f", "best", "--no-mtime"]
    };
    ToolCommand::new(ytdlp)
        .args(format)
        .arg("-o")
        .arg(&job.output_template)
        .arg(&job.url)
}

/// Runs one job to its end. Every failure is recorded on the job.
pub(crate) fn run(shared: &Shared, id: JobId, run: u64) {
    let Some(job) = shared.registry.update_current(id, run, |entry| entry.job.clone()) else {
        tracing::debug!(job_id = %id, "job changed before its worker started");
        return;
    };

    let command = build_command(&shared.ytdlp, &job);
    tracing::debug!(job_id = %id, command = %command.display(), "starting download");

    let end = drive(shared, id, run, &command);
    finish(shared, &job, run, end);
}

/// Spawns the tool, attaches it to the job and follows its output.
fn drive(shared: &Shared, id: JobId, run: u64, command: &ToolCommand) -> RunEnd {
    let process = match command.spawn() {
        Ok(process) => process,
        Err(e) => return RunEnd::Failed(e.to_string()),
    };

    let pid = process.pid();
    let handle = process.handle();
    let attached = shared.registry.update_current(id, run, |entry| {
        entry.process = Some(handle);
        entry.job.attach_process(pid);
    });
    if attached.is_none() {
        if let Err(e) = process.abort() {
            tracing::warn!(job_id = %id, error = %e, "failed to reap abandoned process");
        }
        return RunEnd::Abandoned;
    }
    tracing::debug!(job_id = %id, pid, "tool started");

    while let Some(line) = process.next_line() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                if let Err(abort_err) = process.abort() {
                    tracing::warn!(job_id = %id, error = %abort_err, "failed to reap process");
                }
                return RunEnd::Failed(e.to_string());
            }
        };

        let Some(percent) = parse_progress(&line) else {
            tracing::trace!(job_id = %id, line = %line, "tool output");
            continue;
        };
        let updated = shared.registry.update_current(id, run, |entry| {
            let previous = entry.job.progress;
            if entry.job.set_progress(percent) != previous {
                entry.record(EventKind::Progress);
            }
        });
        if updated.is_some() {
            shared.deliver(id);
        }
    }

    // The tool is done writing. Detach it before reaping so that a late
    // pause finds nothing to interrupt instead of a finished download.
    shared.registry.update_current(id, run, |entry| {
        entry.process = None;
        entry.job.detach_process();
    });

    match process.wait() {
        Ok(status) => RunEnd::Exited(status),
        Err(e) => RunEnd::Failed(e.to_string()),
    }
}

/// Detaches the tool and records the outcome, unless the job moved on.
fn finish(shared: &Shared, job: &DownloadJob, run: u64, end: RunEnd) {
    let id = job.id;
    let still_current = shared.registry.update_current(id, run, |entry| {
        entry.process = None;
        entry.job.detach_process();
    });
    if still_current.is_none() {
        tracing::debug!(job_id = %id, "worker superseded; dropping outcome");
        return;
    }

    let outcome = match end {
        RunEnd::Abandoned => return,
        RunEnd::Failed(detail) => Err(detail),
        RunEnd::Exited(status) => settle_output(shared, job, status).map_err(|e| e.to_string()),
    };

    let recorded = shared.registry.update_current(id, run, |entry| match &outcome {
        Ok(path) => {
            entry.job.mark_completed(path.clone());
            entry.record(EventKind::Complete);
        }
        Err(detail) => {
            entry.job.mark_failed(detail.clone());
            entry.record(EventKind::Error);
        }
    });
    if recorded.is_none() {
        tracing::debug!(job_id = %id, "job changed while settling output");
        return;
    }

    match &outcome {
        Ok(path) => tracing::info!(job_id = %id, path = %path.display(), "download completed"),
        Err(detail) => tracing::error!(job_id = %id, error = %detail, "download failed"),
    }
    shared.deliver(id);
}

/// Interprets the exit status and puts the artifact where it belongs.
fn settle_output(shared: &Shared, job: &DownloadJob, status: ExitStatus) -> Result<PathBuf> {
    let tool = shared.tool_name();
    match status.code() {
        Some(0) => {}
        Some(code) => return Err(ManagerError::NonZeroExit { tool, code }),
        None => return Err(ManagerError::Terminated { tool }),
    }

    let produced = resolve_output(&job.output_template).ok_or_else(|| {
        ManagerError::OutputNotFound {
            template: job.output_template.clone(),
        }
    })?;

    if shared.config.relocate.applies(&job.temp_dir, &job.final_dir) {
        relocate(&produced, &job.final_dir)
    } else {
        Ok(produced)
    }
}
