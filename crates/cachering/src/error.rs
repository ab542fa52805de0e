//! Error types for the cachering crate.
//!
//! Ring operations are infallible: an empty ring and an aborted removal are
//! ordinary outcomes. Only loading a [`RingConfig`](crate::RingConfig) can fail.

use std::path::PathBuf;

/// Errors produced while loading ring configuration.
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config contents are not valid TOML for [`RingConfig`](crate::RingConfig).
    #[error("invalid ring config: {0}")]
    Parse(#[from] toml::de::Error),
}
