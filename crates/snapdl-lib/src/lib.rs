//! Rust library for downloading media through `yt-dlp`.
//!
//! This is a facade crate that re-exports functionality from the snapdl
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```no_run
//! use snapdl_lib::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (observer, mut events) = ChannelObserver::channel();
//!     let manager = DownloadManager::new(ManagerConfig::detect(".")?, observer)?;
//!
//!     let id = manager.create_job(DownloadRequest::new("https://youtu.be/xyz", "Some video"))?;
//!     while let Some(event) = events.blocking_recv() {
//!         if event.job().id == id && event.kind().is_terminal() {
//!             println!("{:?}", event.job().final_path);
//!             break;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/snapdl/snapdl/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use snapdl_types::*;

// Re-export tool plumbing
pub use snapdl_process::{
    BINARIES_SUBDIR, ProcessError, ProcessHandle, RunningProcess, Termination,
    ThumbnailGenerator, ToolCommand, locate_tool, parse_progress, tool_version,
};

// Re-export the download manager
#[cfg(feature = "manager")]
pub use snapdl_manager::{
    CANDIDATE_EXTENSIONS, Callbacks, ChannelObserver, DEFAULT_DIR_NAME, DEFAULT_YTDLP,
    DownloadManager, EventKind, EventObserver, JobCallback, JobEvent, ManagerConfig, ManagerError,
    RelocatePolicy, resolve_output,
};

/// Prelude module for convenient imports.
///
/// ```
/// use snapdl_lib::prelude::*;
/// ```
pub mod prelude {
    pub use snapdl_types::{
        DownloadJob, DownloadRequest, JobId, JobStatus, SearchResponse, SearchResult,
        SnapdlError, sanitize_title,
    };

    pub use snapdl_process::{ThumbnailGenerator, locate_tool, parse_progress};

    #[cfg(feature = "manager")]
    pub use snapdl_manager::{
        Callbacks, ChannelObserver, DownloadManager, EventKind, EventObserver, JobEvent,
        ManagerConfig, ManagerError, resolve_output,
    };
}
