//! Thread-safe job storage.

use crate::events::EventKind;
use crate::locks::lock_or_recover;
use indexmap::IndexMap;
use snapdl_process::ProcessHandle;
use snapdl_types::{DownloadJob, JobId, JobStatus};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// A job record together with what only the manager may see.
#[derive(Debug)]
pub(crate) struct JobEntry {
    pub(crate) job: DownloadJob,
    /// Terminates the running tool. Set only while `job.status` is
    /// downloading.
    pub(crate) process: Option<ProcessHandle>,
    /// Bumped by every start. A worker acts only while its run is current.
    pub(crate) run: u64,
    /// Events recorded in the order the changes happened, not yet delivered.
    outbox: VecDeque<(EventKind, DownloadJob)>,
    /// Set while some thread is delivering this job's events.
    delivering: bool,
}

impl JobEntry {
    const fn new(job: DownloadJob) -> Self {
        Self {
            job,
            process: None,
            run: 0,
            outbox: VecDeque::new(),
            delivering: false,
        }
    }

    /// Queues an event carrying the current state of the job.
    pub(crate) fn record(&mut self, kind: EventKind) {
        self.outbox.push_back((kind, self.job.clone()));
    }

    /// Returns true if the worker for `run` still owns this job.
    pub(crate) fn is_current(&self, run: u64) -> bool {
        self.run == run && self.job.status == JobStatus::Downloading
    }
}

/// Jobs keyed by id, in creation order, behind one lock.
///
/// The lock covers only metadata reads and writes. Nothing blocks on the
/// external tool while holding it.
#[derive(Debug, Default)]
pub(crate) struct JobRegistry {
    jobs: Mutex<IndexMap<JobId, JobEntry>>,
}

impl JobRegistry {
    fn lock(&self) -> MutexGuard<'_, IndexMap<JobId, JobEntry>> {
        lock_or_recover(&self.jobs)
    }

    pub(crate) fn insert(&self, job: DownloadJob) {
        self.lock().insert(job.id, JobEntry::new(job));
    }

    /// Returns a snapshot of one job.
    pub(crate) fn get(&self, id: JobId) -> Option<DownloadJob> {
        self.lock().get(&id).map(|entry| entry.job.clone())
    }

    /// Returns snapshots of every job in creation order.
    pub(crate) fn list(&self) -> Vec<DownloadJob> {
        self.lock().values().map(|entry| entry.job.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Detaches a job, keeping the order of the others.
    pub(crate) fn remove(&self, id: JobId) -> Option<JobEntry> {
        self.lock().shift_remove(&id)
    }

    /// Runs `f` on the entry for `id` under the lock.
    pub(crate) fn update<R>(&self, id: JobId, f: impl FnOnce(&mut JobEntry) -> R) -> Option<R> {
        self.lock().get_mut(&id).map(f)
    }

    /// Runs `f` on the entry for `id` only if the worker for `run` still
    /// owns it.
    pub(crate) fn update_current<R>(
        &self,
        id: JobId,
        run: u64,
        f: impl FnOnce(&mut JobEntry) -> R,
    ) -> Option<R> {
        self.lock()
            .get_mut(&id)
            .filter(|entry| entry.is_current(run))
            .map(f)
    }

    /// Takes the next queued event for `id`.
    ///
    /// One thread at a time delivers a job's events. A caller that is not
    /// yet delivering (`delivering == false`) gets `None` while another
    /// thread is; that thread picks up the events it queued. The role is
    /// released when the outbox runs dry.
    pub(crate) fn next_event(
        &self,
        id: JobId,
        delivering: bool,
    ) -> Option<(EventKind, DownloadJob)> {
        let mut jobs = self.lock();
        let entry = jobs.get_mut(&id)?;
        if entry.delivering && !delivering {
            return None;
        }
        let next = entry.outbox.pop_front();
        entry.delivering = next.is_some();
        next
    }
}
