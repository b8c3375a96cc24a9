//! Error types for external tool handling.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for process operations.
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Errors that can occur while locating, running or stopping a tool.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The tool could not be started.
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        /// The program that could not be spawned.
        program: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Reading the tool's output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A spawned tool did not expose the requested pipe.
    #[error("Output pipe of '{program}' is unavailable")]
    MissingPipe {
        /// The program whose pipe was missing.
        program: PathBuf,
    },

    /// Neither the graceful nor the forceful termination request succeeded.
    #[error("Failed to terminate process {pid}: {detail}")]
    Terminate {
        /// The process that could not be terminated.
        pid: u32,
        /// What the termination commands reported.
        detail: String,
    },

    /// The tool is neither on `PATH` nor bundled.
    #[error("External tool not found: {tool} (searched: {searched})")]
    ToolNotFound {
        /// The tool name or path that was requested.
        tool: String,
        /// Locations that were tried, comma separated.
        searched: String,
    },

    /// The tool ran but reported failure.
    #[error("{tool} failed (code={code:?}): {stderr}")]
    ToolFailed {
        /// The tool that failed.
        tool: String,
        /// Exit code, absent when killed by a signal.
        code: Option<i32>,
        /// Trimmed standard error output.
        stderr: String,
    },
}
