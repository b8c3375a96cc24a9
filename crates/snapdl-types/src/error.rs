//! Error types for snapdl core types.

use thiserror::Error;

/// Result type alias for snapdl type-level operations.
pub type Result<T> = std::result::Result<T, SnapdlError>;

/// Errors raised while building or parsing core values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapdlError {
    /// A download request is missing a required field.
    #[error("Invalid download request: {0}")]
    InvalidRequest(String),

    /// A status string did not name a known job status.
    #[error("Unknown job status: {0}")]
    UnknownStatus(String),
}
