//! External tool plumbing for the snapdl media downloader.
//!
//! - [`ToolCommand`] - Command line for an external tool
//! - [`RunningProcess`] - A spawned tool whose output is read line by line
//! - [`ProcessHandle`] - Terminates a running tool by process ID
//! - [`parse_progress`] - Extracts a percentage from a line of tool output
//! - [`locate_tool`] - Finds a tool on `PATH` or in the bundled binaries
//! - [`ThumbnailGenerator`] - Still-frame extraction through `ffmpeg`

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/snapdl/snapdl/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod locate;
mod progress;
mod runner;
mod thumbnail;

pub use error::{ProcessError, Result};
pub use locate::{BINARIES_SUBDIR, locate_tool, tool_version};
pub use progress::parse_progress;
pub use runner::{ProcessHandle, RunningProcess, Termination, ToolCommand};
pub use thumbnail::ThumbnailGenerator;
