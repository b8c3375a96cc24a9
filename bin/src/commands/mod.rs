//! CLI command implementations.

pub(crate) mod download;
pub(crate) mod thumbnail;
pub(crate) mod tools;
