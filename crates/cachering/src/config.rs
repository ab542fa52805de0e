//! Ring configuration, parsed from TOML.
//!
//! ```toml
//! replicas = 50
//! hash = "crc32"
//! nodes = ["cache-a:8001", "cache-b:8001"]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::RingError;
use crate::hash::HashAlgorithm;

/// Default number of virtual nodes per real node.
pub const DEFAULT_REPLICAS: usize = 50;

/// Construction parameters for a [`Ring`](crate::Ring).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Virtual nodes per real node. Zero yields a ring that routes nothing.
    pub replicas: usize,
    /// Hash used for both keys and virtual nodes.
    pub hash: HashAlgorithm,
    /// Nodes added when the ring is built from this config.
    pub nodes: Vec<String>,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            hash: HashAlgorithm::default(),
            nodes: Vec::new(),
        }
    }
}

impl RingConfig {
    /// Parse a config from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, RingError> {
        Ok(toml::from_str(s)?)
    }

    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, RingError> {
        let content = std::fs::read_to_string(path).map_err(|source| RingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }
}
