//! Core types for the snapdl media downloader.
//!
//! This crate provides the data structures shared by the other snapdl crates:
//!
//! - [`JobId`] - Unique identifier for a download job
//! - [`JobStatus`] - Lifecycle status of a job
//! - [`DownloadJob`] - A job record; every value handed out is a snapshot
//! - [`DownloadRequest`] - Caller-supplied parameters for a new job
//! - [`SearchResponse`] / [`SearchResult`] - Output of a search front end
//! - [`sanitize_title`] - Filesystem-safe file stem from a media title

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/snapdl/snapdl/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod job;
mod request;
mod search;

pub use error::{Result, SnapdlError};
pub use job::{DownloadJob, JobId, JobStatus, OUTPUT_EXT_PLACEHOLDER};
pub use request::{DownloadRequest, sanitize_title};
pub use search::{SearchResponse, SearchResult};
