//! Download job definitions and types.

use crate::{DownloadRequest, SnapdlError, sanitize_title};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a download job.
pub type JobId = Uuid;

/// Placeholder the external tool replaces with the produced file's extension.
pub const OUTPUT_EXT_PLACEHOLDER: &str = "%(ext)s";

/// Status of a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job is created but no worker has been launched yet.
    #[default]
    Queued,
    /// A worker is driving the external tool for this job.
    Downloading,
    /// The user paused the job; it can be resumed.
    Paused,
    /// The user stopped the job; it can be resumed.
    Stopped,
    /// The artifact was produced and located. No transition leaves this state.
    Completed,
    /// The run failed; `error_detail` says why. It can be retried.
    Error,
}

impl JobStatus {
    /// Returns true if a worker is (or is about to be) running for the job.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Downloading)
    }

    /// Returns true if `resume` may restart a job in this state.
    #[must_use]
    pub const fn is_resumable(&self) -> bool {
        matches!(self, Self::Paused | Self::Stopped | Self::Error)
    }

    /// Returns true if `start` may launch a worker from this state.
    #[must_use]
    pub const fn can_start(&self) -> bool {
        !matches!(self, Self::Downloading | Self::Completed)
    }

    /// Returns true if nothing will happen to the job without user action.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Queued | Self::Downloading)
    }

    /// Returns the status as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = SnapdlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "downloading" => Ok(Self::Downloading),
            "paused" => Ok(Self::Paused),
            "stopped" => Ok(Self::Stopped),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            other => Err(SnapdlError::UnknownStatus(other.to_string())),
        }
    }
}

/// A single user-requested download.
///
/// The live record is owned by the job registry and only mutated under its
/// lock through the `mark_*` methods, which keep these invariants:
///
/// - `pid` is set only while `status` is [`JobStatus::Downloading`]
/// - `final_path` is set if and only if `status` is [`JobStatus::Completed`]
/// - `error_detail` is set if and only if `status` is [`JobStatus::Error`]
///
/// Every `DownloadJob` handed to callers or observers is a clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadJob {
    /// Unique identifier for this job.
    pub id: JobId,
    /// Source locator passed to the external tool.
    pub url: String,
    /// Media title as supplied by the caller.
    pub title: String,
    /// Uploader or channel name.
    pub uploader: String,
    /// Thumbnail locator, possibly empty.
    pub thumbnail: String,
    /// Extract audio only instead of downloading the best combined format.
    pub only_audio: bool,
    /// Current status of the job.
    pub status: JobStatus,
    /// Completion percentage in `[0.0, 100.0]`.
    pub progress: f64,
    /// Process ID of the external tool while it runs.
    pub pid: Option<u32>,
    /// Output path handed to the tool, containing [`OUTPUT_EXT_PLACEHOLDER`].
    pub output_template: PathBuf,
    /// Location of the produced file once completed.
    pub final_path: Option<PathBuf>,
    /// Human-readable failure description once failed.
    pub error_detail: Option<String>,
    /// Directory the tool writes into.
    pub temp_dir: PathBuf,
    /// Directory finished files settle in.
    pub final_dir: PathBuf,
    /// Timestamp when the job was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last state mutation.
    pub updated_at: DateTime<Utc>,
}

impl DownloadJob {
    /// Creates a queued job for the request.
    ///
    /// The output template is `<temp_dir>/<sanitized title>.%(ext)s`; a title
    /// that sanitizes to nothing falls back to the job id.
    #[must_use]
    pub fn new(request: DownloadRequest, temp_dir: &Path, final_dir: &Path) -> Self {
        let id = Uuid::new_v4();
        let stem = sanitize_title(&request.title, &id.to_string());
        let output_template = temp_dir.join(format!("{stem}.{OUTPUT_EXT_PLACEHOLDER}"));
        let now = Utc::now();

        Self {
            id,
            url: request.url,
            title: request.title,
            uploader: request.uploader,
            thumbnail: request.thumbnail,
            only_audio: request.only_audio,
            status: JobStatus::Queued,
            progress: 0.0,
            pid: None,
            output_template,
            final_path: None,
            error_detail: None,
            temp_dir: temp_dir.to_path_buf(),
            final_dir: final_dir.to_path_buf(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the output file stem, i.e. the template's file name without
    /// the `.%(ext)s` suffix.
    #[must_use]
    pub fn output_stem(&self) -> String {
        let name = self
            .output_template
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = format!(".{OUTPUT_EXT_PLACEHOLDER}");
        name.strip_suffix(&suffix)
            .map_or_else(|| name.clone(), str::to_string)
    }

    /// Returns true if the job has reached [`JobStatus::Completed`].
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }

    /// Checks the field invariants documented on the type.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let pid_ok = self.pid.is_none() || self.status == JobStatus::Downloading;
        let final_ok = self.final_path.is_some() == (self.status == JobStatus::Completed);
        let error_ok = self.error_detail.is_some() == (self.status == JobStatus::Error);
        let progress_ok = (0.0..=100.0).contains(&self.progress);
        pid_ok && final_ok && error_ok && progress_ok
    }

    /// Moves the job back to `queued` ahead of a resume.
    pub fn mark_queued(&mut self) {
        self.status = JobStatus::Queued;
        self.error_detail = None;
        self.pid = None;
        self.touch();
    }

    /// Marks the job as downloading.
    pub fn mark_downloading(&mut self) {
        self.status = JobStatus::Downloading;
        self.error_detail = None;
        self.final_path = None;
        self.touch();
    }

    /// Records the process ID of the external tool.
    pub fn attach_process(&mut self, pid: u32) {
        self.pid = Some(pid);
        self.touch();
    }

    /// Forgets the external tool's process ID.
    pub fn detach_process(&mut self) {
        self.pid = None;
        self.touch();
    }

    /// Sets the progress percentage, clamped to `[0.0, 100.0]`, and returns
    /// the stored value.
    pub fn set_progress(&mut self, percent: f64) -> f64 {
        self.progress = clamp_percent(percent);
        self.touch();
        self.progress
    }

    /// Marks the job as completed with the located artifact.
    pub fn mark_completed(&mut self, final_path: PathBuf) {
        self.status = JobStatus::Completed;
        self.final_path = Some(final_path);
        self.error_detail = None;
        self.progress = 100.0;
        self.pid = None;
        self.touch();
    }

    /// Marks the job as failed.
    pub fn mark_failed(&mut self, detail: impl Into<String>) {
        self.status = JobStatus::Error;
        self.error_detail = Some(detail.into());
        self.final_path = None;
        self.pid = None;
        self.touch();
    }

    /// Marks the job as paused by the user.
    pub fn mark_paused(&mut self) {
        self.status = JobStatus::Paused;
        self.pid = None;
        self.touch();
    }

    /// Marks the job as stopped by the user.
    pub fn mark_stopped(&mut self) {
        self.status = JobStatus::Stopped;
        self.pid = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Clamps a percentage into `[0.0, 100.0]`. NaN maps to `0.0`.
#[must_use]
pub(crate) fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_job() -> DownloadJob {
        let request = DownloadRequest::new("https://example.com/watch?v=abc", "My Video")
            .with_uploader("Someone");
        DownloadJob::new(request, Path::new("/tmp/snapdl"), Path::new("/tmp/snapdl"))
    }

    #[test]
    fn test_job_status_predicates() {
        assert!(JobStatus::Queued.can_start());
        assert!(JobStatus::Paused.can_start());
        assert!(JobStatus::Error.can_start());
        assert!(!JobStatus::Downloading.can_start());
        assert!(!JobStatus::Completed.can_start());

        assert!(JobStatus::Stopped.is_resumable());
        assert!(!JobStatus::Completed.is_resumable());
        assert!(!JobStatus::Queued.is_resumable());

        assert!(!JobStatus::Downloading.is_settled());
        assert!(JobStatus::Error.is_settled());
    }

    #[test]
    fn test_job_status_round_trips_through_str() {
        for status in [
            JobStatus::Queued,
            JobStatus::Downloading,
            JobStatus::Paused,
            JobStatus::Stopped,
            JobStatus::Completed,
            JobStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("finished".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_new_job_builds_template() {
        let job = create_test_job();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(
            job.output_template,
            PathBuf::from("/tmp/snapdl/My Video.%(ext)s")
        );
        assert_eq!(job.output_stem(), "My Video");
        assert!(job.is_consistent());
    }

    #[test]
    fn test_empty_title_falls_back_to_id() {
        let request = DownloadRequest::new("https://example.com/x", "???/:*");
        let job = DownloadJob::new(request, Path::new("/tmp"), Path::new("/tmp"));
        assert_eq!(job.output_stem(), job.id.to_string());
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut job = create_test_job();
        job.mark_downloading();

        assert_relative_eq!(job.set_progress(45.2), 45.2);
        assert_relative_eq!(job.set_progress(150.0), 100.0);
        assert_relative_eq!(job.set_progress(-3.0), 0.0);
        assert_relative_eq!(job.set_progress(f64::NAN), 0.0);
    }

    #[test]
    fn test_clamp_is_idempotent() {
        for value in [-10.0, 0.0, 42.5, 100.0, 150.0] {
            assert_relative_eq!(clamp_percent(clamp_percent(value)), clamp_percent(value));
        }
    }

    #[test]
    fn test_lifecycle_keeps_invariants() {
        let mut job = create_test_job();

        job.mark_downloading();
        job.attach_process(4242);
        assert_eq!(job.pid, Some(4242));
        assert!(job.is_consistent());

        job.mark_failed("tool exited with code 1");
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.pid.is_none());
        assert!(job.is_consistent());

        job.mark_queued();
        assert!(job.error_detail.is_none());
        job.mark_downloading();
        job.mark_completed(PathBuf::from("/tmp/snapdl/My Video.mp4"));
        assert_relative_eq!(job.progress, 100.0);
        assert!(job.is_completed());
        assert!(job.is_consistent());
    }

    #[test]
    fn test_pause_and_stop_clear_pid() {
        let mut job = create_test_job();
        job.mark_downloading();
        job.attach_process(1);
        job.mark_paused();
        assert!(job.pid.is_none());
        assert!(job.is_consistent());

        job.mark_downloading();
        job.attach_process(2);
        job.mark_stopped();
        assert_eq!(job.status, JobStatus::Stopped);
        assert!(job.is_consistent());
    }

    #[test]
    fn test_job_serializes_status_lowercase() {
        let job = create_test_job();
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "queued");
        assert_eq!(json["title"], "My Video");
    }
}
