//! The download manager: job registry, lifecycle operations and workers.

use crate::events::{EventKind, EventObserver, Notifier};
use crate::registry::JobRegistry;
use crate::resolve::remove_partials;
use crate::{ManagerConfig, ManagerError, Result, worker};
use snapdl_process::{ProcessHandle, Termination, locate_tool};
use snapdl_types::{DownloadJob, DownloadRequest, JobId};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// State shared between the manager handle and its workers.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: ManagerConfig,
    /// Resolved `yt-dlp` program.
    pub(crate) ytdlp: PathBuf,
    pub(crate) registry: JobRegistry,
    pub(crate) notifier: Notifier,
    launches: AtomicUsize,
}

impl Shared {
    /// Short tool name for error details.
    pub(crate) fn tool_name(&self) -> String {
        self.ytdlp.file_stem().map_or_else(
            || self.ytdlp.display().to_string(),
            |stem| stem.to_string_lossy().into_owned(),
        )
    }

    /// Delivers the job's queued events, unless another thread already is.
    ///
    /// Observers run without the registry lock held, so they may call back
    /// into the manager. Events they cause are delivered after they return.
    pub(crate) fn deliver(&self, id: JobId) {
        let mut delivering = false;
        while let Some((kind, job)) = self.registry.next_event(id, delivering) {
            delivering = true;
            self.notifier.emit(kind, &job);
        }
    }
}

/// Tracks download jobs and runs one worker thread per downloading job.
///
/// Cloning the manager is cheap; clones share the same jobs. Every
/// [`DownloadJob`] it returns is a snapshot.
///
/// Jobs move `queued -> downloading -> completed | error`. A downloading job
/// can be paused or stopped, and paused, stopped or failed jobs can be
/// resumed. Nothing leaves `completed`.
#[derive(Debug, Clone)]
pub struct DownloadManager {
    shared: Arc<Shared>,
}

impl DownloadManager {
    /// Creates a manager reporting to a single observer.
    ///
    /// Resolves `yt-dlp` and creates the download and temp directories.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Tool`] if `yt-dlp` cannot be found and
    /// [`ManagerError::CreateDir`] if a directory cannot be created.
    pub fn new(config: ManagerConfig, observer: impl EventObserver + 'static) -> Result<Self> {
        Self::with_observers(config, vec![Box::new(observer)])
    }

    /// Creates a manager reporting to several observers, in order.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_observers(
        config: ManagerConfig,
        observers: Vec<Box<dyn EventObserver>>,
    ) -> Result<Self> {
        let ytdlp = locate_tool(&config.ytdlp, &config.base_dir)?;

        for dir in [config.download_dir.as_path(), config.temp_dir()] {
            std::fs::create_dir_all(dir).map_err(|e| ManagerError::CreateDir {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        tracing::debug!(
            ytdlp = %ytdlp.display(),
            download_dir = %config.download_dir.display(),
            temp_dir = %config.temp_dir().display(),
            "download manager ready"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                ytdlp,
                registry: JobRegistry::default(),
                notifier: Notifier::new(observers),
                launches: AtomicUsize::new(0),
            }),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.shared.config
    }

    /// Returns the resolved `yt-dlp` program.
    #[must_use]
    pub fn ytdlp(&self) -> &Path {
        &self.shared.ytdlp
    }

    /// Creates a job for `request` and starts it.
    ///
    /// Returns as soon as the job is registered; the download proceeds on a
    /// worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::InvalidRequest`] if the request has no URL.
    pub fn create_job(&self, request: DownloadRequest) -> Result<JobId> {
        request.validate()?;
        let job = DownloadJob::new(
            request,
            self.shared.config.temp_dir(),
            &self.shared.config.download_dir,
        );
        let id = job.id;
        tracing::debug!(
            job_id = %id,
            url = %job.url,
            template = %job.output_template.display(),
            "job created"
        );

        self.shared.registry.insert(job);
        self.start(id);
        Ok(id)
    }

    /// Launches a worker for the job.
    ///
    /// Does nothing and returns false if the job does not exist or is
    /// already downloading or completed.
    pub fn start(&self, id: JobId) -> bool {
        let launched = self.shared.registry.update(id, |entry| {
            if !entry.job.status.can_start() {
                return None;
            }
            entry.run += 1;
            entry.process = None;
            entry.job.mark_downloading();
            entry.record(EventKind::Status);
            Some(entry.run)
        });
        let Some(run) = launched.flatten() else {
            return false;
        };

        self.shared.deliver(id);
        self.spawn_worker(id, run);
        true
    }

    fn spawn_worker(&self, id: JobId, run: u64) {
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("snapdl-job-{id}"))
            .spawn(move || {
                if catch_unwind(AssertUnwindSafe(|| worker::run(&shared, id, run))).is_err() {
                    fail_run(&shared, id, run, "download worker panicked".to_string());
                }
            });

        match spawned {
            Ok(_) => {
                self.shared.launches.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => fail_run(
                &self.shared,
                id,
                run,
                ManagerError::SpawnWorker(e).to_string(),
            ),
        }
    }

    /// Pauses a downloading job by terminating its tool.
    ///
    /// Returns false, changing nothing, if no tool is attached to the job.
    pub fn pause(&self, id: JobId) -> bool {
        self.interrupt(id, DownloadJob::mark_paused).is_some()
    }

    /// Stops a downloading job by terminating its tool.
    ///
    /// With `clean_partial`, files named after the job's output stem are
    /// deleted from the download and temp directories. Returns false,
    /// changing nothing, if no tool is attached to the job.
    pub fn stop(&self, id: JobId, clean_partial: bool) -> bool {
        let Some(job) = self.interrupt(id, DownloadJob::mark_stopped) else {
            return false;
        };

        if clean_partial {
            let stem = job.output_stem();
            let mut removed = remove_partials(&job.final_dir, &stem);
            if job.temp_dir != job.final_dir {
                removed += remove_partials(&job.temp_dir, &stem);
            }
            tracing::debug!(job_id = %id, removed, "cleaned partial files");
        }
        true
    }

    /// Detaches the tool, applies `mark` and terminates the tool.
    fn interrupt(&self, id: JobId, mark: fn(&mut DownloadJob)) -> Option<DownloadJob> {
        let (handle, snapshot) = self
            .shared
            .registry
            .update(id, |entry| {
                let handle = entry.process.take()?;
                mark(&mut entry.job);
                entry.record(EventKind::Status);
                Some((handle, entry.job.clone()))
            })
            .flatten()?;

        terminate(id, &handle);
        tracing::info!(job_id = %id, status = %snapshot.status, "download interrupted");
        self.shared.deliver(id);
        Some(snapshot)
    }

    /// Restarts a paused, stopped or failed job.
    ///
    /// Returns false, changing nothing, for any other state.
    pub fn resume(&self, id: JobId) -> bool {
        let requeued = self.shared.registry.update(id, |entry| {
            if entry.job.status.is_resumable() {
                entry.job.mark_queued();
                true
            } else {
                false
            }
        });
        if requeued != Some(true) {
            return false;
        }
        self.start(id)
    }

    /// Removes a job, terminating its tool if one is running.
    ///
    /// Returns the removed job's last state.
    pub fn remove(&self, id: JobId) -> Option<DownloadJob> {
        let entry = self.shared.registry.remove(id)?;
        if let Some(handle) = &entry.process {
            terminate(id, handle);
        }
        tracing::debug!(job_id = %id, "job removed");
        Some(entry.job)
    }

    /// Returns a snapshot of one job.
    #[must_use]
    pub fn job(&self, id: JobId) -> Option<DownloadJob> {
        self.shared.registry.get(id)
    }

    /// Returns snapshots of all jobs in creation order.
    #[must_use]
    pub fn list_jobs(&self) -> Vec<DownloadJob> {
        self.shared.registry.list()
    }

    /// Returns the number of registered jobs.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.shared.registry.len()
    }

    /// Returns how many worker threads have been launched so far.
    #[must_use]
    pub fn worker_launches(&self) -> usize {
        self.shared.launches.load(Ordering::SeqCst)
    }
}

/// Marks the run failed if it is still current and reports it.
fn fail_run(shared: &Shared, id: JobId, run: u64, detail: String) {
    let failed = shared.registry.update_current(id, run, |entry| {
        entry.process = None;
        entry.job.mark_failed(detail.as_str());
        entry.record(EventKind::Error);
    });
    if failed.is_some() {
        tracing::error!(job_id = %id, error = %detail, "download failed");
        shared.deliver(id);
    }
}

/// Best-effort termination; failures are only logged.
fn terminate(id: JobId, handle: &ProcessHandle) {
    match handle.terminate() {
        Ok(Termination::Graceful) => {}
        Ok(Termination::AlreadyExited) => {
            tracing::debug!(job_id = %id, pid = handle.pid(), "tool had already exited");
        }
        Ok(Termination::Forced) => {
            tracing::warn!(job_id = %id, pid = handle.pid(), "graceful termination failed; killed");
        }
        Err(e) => {
            tracing::warn!(job_id = %id, error = %e, "failed to terminate tool");
        }
    }
}
