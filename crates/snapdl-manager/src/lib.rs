//! Download lifecycle management for the snapdl media downloader.
//!
//! - [`DownloadManager`] - Job registry plus one worker thread per active job
//! - [`ManagerConfig`] - Tool location and download directories
//! - [`EventObserver`] - Receives progress, status, completion and error events
//! - [`Callbacks`] - Observer built from optional closures
//! - [`ChannelObserver`] - Observer forwarding [`JobEvent`]s into a channel
//! - [`resolve_output`] - Finds the file a finished job produced

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/snapdl/snapdl/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod events;
mod locks;
mod manager;
mod registry;
mod resolve;
mod worker;

pub use config::{DEFAULT_DIR_NAME, DEFAULT_YTDLP, ManagerConfig, RelocatePolicy};
pub use error::{ManagerError, Result};
pub use events::{Callbacks, ChannelObserver, EventKind, EventObserver, JobCallback, JobEvent};
pub use manager::DownloadManager;
pub use resolve::{CANDIDATE_EXTENSIONS, resolve_output};
