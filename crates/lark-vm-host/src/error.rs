//! Host setup errors

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring the host surface.
///
/// Failures inside script-visible host functions are `VmError`s instead,
/// so scripts see them like any other runtime error.
#[derive(Debug, Error)]
pub enum HostError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        /// Config path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::HostConfig`]
    #[error("invalid config: {0}")]
    ParseConfig(#[from] toml::de::Error),
}

/// Result type for host setup
pub type HostResult<T> = std::result::Result<T, HostError>;
