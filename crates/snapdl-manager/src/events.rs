//! Job event delivery.

use serde::Serialize;
use snapdl_types::DownloadJob;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// The four kinds of job event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Progress changed.
    Progress,
    /// Status changed by a start, pause or stop.
    Status,
    /// The job completed.
    Complete,
    /// The job failed.
    Error,
}

impl EventKind {
    /// Returns the event kind as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Progress => "progress",
            Self::Status => "status",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    /// Returns true for the last event of a run.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives job events.
///
/// Every method gets a snapshot of the job taken when the event happened.
/// Methods are called from worker threads and from whichever thread
/// requested a start, pause or stop, so implementations should return
/// quickly. A panic inside an observer is caught and logged; it never
/// reaches the job.
///
/// For one job run, progress events arrive in the order the tool printed
/// them and a completion or error event is always the last one.
pub trait EventObserver: Send + Sync {
    /// Called when a job's progress changes.
    fn on_progress(&self, _job: &DownloadJob) {}

    /// Called when a job starts, pauses or stops.
    fn on_status(&self, _job: &DownloadJob) {}

    /// Called when a job completes.
    fn on_complete(&self, _job: &DownloadJob) {}

    /// Called when a job fails.
    fn on_error(&self, _job: &DownloadJob) {}
}

/// Boxed callback taking a job snapshot.
pub type JobCallback = Box<dyn Fn(&DownloadJob) + Send + Sync>;

/// An [`EventObserver`] made of optional closures.
#[derive(Default)]
pub struct Callbacks {
    progress: Option<JobCallback>,
    status: Option<JobCallback>,
    complete: Option<JobCallback>,
    error: Option<JobCallback>,
}

impl Callbacks {
    /// Creates an observer with no callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the progress callback.
    #[must_use]
    pub fn on_progress(mut self, f: impl Fn(&DownloadJob) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Sets the status callback.
    #[must_use]
    pub fn on_status(mut self, f: impl Fn(&DownloadJob) + Send + Sync + 'static) -> Self {
        self.status = Some(Box::new(f));
        self
    }

    /// Sets the completion callback.
    #[must_use]
    pub fn on_complete(mut self, f: impl Fn(&DownloadJob) + Send + Sync + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }

    /// Sets the error callback.
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&DownloadJob) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("progress", &self.progress.is_some())
            .field("status", &self.status.is_some())
            .field("complete", &self.complete.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl EventObserver for Callbacks {
    fn on_progress(&self, job: &DownloadJob) {
        if let Some(f) = &self.progress {
            f(job);
        }
    }

    fn on_status(&self, job: &DownloadJob) {
        if let Some(f) = &self.status {
            f(job);
        }
    }

    fn on_complete(&self, job: &DownloadJob) {
        if let Some(f) = &self.complete {
            f(job);
        }
    }

    fn on_error(&self, job: &DownloadJob) {
        if let Some(f) = &self.error {
            f(job);
        }
    }
}

/// A job event with the snapshot it carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "job", rename_all = "lowercase")]
pub enum JobEvent {
    /// Progress changed.
    Progress(DownloadJob),
    /// Status changed by a start, pause or stop.
    Status(DownloadJob),
    /// The job completed.
    Complete(DownloadJob),
    /// The job failed.
    Error(DownloadJob),
}

impl JobEvent {
    /// Wraps a snapshot in the event of the given kind.
    #[must_use]
    pub fn new(kind: EventKind, job: DownloadJob) -> Self {
        match kind {
            EventKind::Progress => Self::Progress(job),
            EventKind::Status => Self::Status(job),
            EventKind::Complete => Self::Complete(job),
            EventKind::Error => Self::Error(job),
        }
    }

    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Progress(_) => EventKind::Progress,
            Self::Status(_) => EventKind::Status,
            Self::Complete(_) => EventKind::Complete,
            Self::Error(_) => EventKind::Error,
        }
    }

    /// Returns the job snapshot.
    #[must_use]
    pub const fn job(&self) -> &DownloadJob {
        match self {
            Self::Progress(job) | Self::Status(job) | Self::Complete(job) | Self::Error(job) => {
                job
            }
        }
    }

    /// Consumes the event, returning the job snapshot.
    #[must_use]
    pub fn into_job(self) -> DownloadJob {
        match self {
            Self::Progress(job) | Self::Status(job) | Self::Complete(job) | Self::Error(job) => {
                job
            }
        }
    }
}

/// Forwards events into an unbounded channel.
///
/// Sending never blocks. Events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<JobEvent>,
}

impl ChannelObserver {
    /// Creates an observer sending into `tx`.
    #[must_use]
    pub const fn new(tx: UnboundedSender<JobEvent>) -> Self {
        Self { tx }
    }

    /// Creates an observer and the receiver for its events.
    #[must_use]
    pub fn channel() -> (Self, UnboundedReceiver<JobEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    fn forward(&self, kind: EventKind, job: &DownloadJob) {
        if self.tx.send(JobEvent::new(kind, job.clone())).is_err() {
            tracing::trace!(job_id = %job.id, event = %kind, "event receiver dropped");
        }
    }
}

impl EventObserver for ChannelObserver {
    fn on_progress(&self, job: &DownloadJob) {
        self.forward(EventKind::Progress, job);
    }

    fn on_status(&self, job: &DownloadJob) {
        self.forward(EventKind::Status, job);
    }

    fn on_complete(&self, job: &DownloadJob) {
        self.forward(EventKind::Complete, job);
    }

    fn on_error(&self, job: &DownloadJob) {
        self.forward(EventKind::Error, job);
    }
}

/// Dispatches events to every registered observer, isolating panics.
pub(crate) struct Notifier {
    observers: Vec<Box<dyn EventObserver>>,
}

impl Notifier {
    pub(crate) fn new(observers: Vec<Box<dyn EventObserver>>) -> Self {
        Self { observers }
    }

    pub(crate) fn emit(&self, kind: EventKind, job: &DownloadJob) {
        for observer in &self.observers {
            let delivered = catch_unwind(AssertUnwindSafe(|| match kind {
                EventKind::Progress => observer.on_progress(job),
                EventKind::Status => observer.on_status(job),
                EventKind::Complete => observer.on_complete(job),
                EventKind::Error => observer.on_error(job),
            }));
            if delivered.is_err() {
                tracing::warn!(job_id = %job.id, event = %kind, "event observer panicked");
            }
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}
