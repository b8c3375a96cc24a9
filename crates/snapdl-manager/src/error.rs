//! Error types for the download manager.

use snapdl_process::ProcessError;
use snapdl_types::SnapdlError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for manager operations.
pub type Result<T> = std::result::Result<T, ManagerError>;

/// Errors raised by the download manager.
///
/// Only construction and job creation return these to the caller. Failures
/// during a download end up as the job's `error_detail`, rendered through
/// `Display`.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadConfig {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config file '{path}': {source}")]
    ParseConfig {
        /// The path that could not be parsed.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Failed to create a download directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Locating, starting or reading the external tool failed.
    #[error(transparent)]
    Tool(#[from] ProcessError),

    /// The download request was rejected.
    #[error(transparent)]
    InvalidRequest(#[from] SnapdlError),

    /// The tool exited successfully but none of the expected files exist.
    #[error("output file not found")]
    OutputNotFound {
        /// The output template that was probed.
        template: PathBuf,
    },

    /// The tool exited with a non-zero code.
    #[error("{tool} exited with code {code}")]
    NonZeroExit {
        /// The tool that failed.
        tool: String,
        /// The exit code.
        code: i32,
    },

    /// The tool was killed by a signal it did not get from us.
    #[error("{tool} was terminated by a signal")]
    Terminated {
        /// The tool that was terminated.
        tool: String,
    },

    /// Failed to move a finished file into the download directory.
    #[error("Failed to move '{from}' to '{to}': {source}")]
    Relocate {
        /// The downloaded file.
        from: PathBuf,
        /// Where it should have gone.
        to: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The worker thread could not be started.
    #[error("Failed to launch worker thread: {0}")]
    SpawnWorker(std::io::Error),
}
