//! Hash functions that place keys and virtual nodes on the ring.
//!
//! The ring only needs a deterministic `&[u8] -> u32` mapping. [`HashFn`]
//! wraps either one of the built-in [`HashAlgorithm`]s or a caller-supplied
//! closure behind a cheap, cloneable handle.

use std::fmt;
use std::sync::Arc;

use crc::{CRC_32_ISO_HDLC, Crc};
use serde::Deserialize;

/// CRC-32/IEEE, the checksum used by zlib, gzip and PNG.
const CRC32_IEEE: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Built-in hash algorithms selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// CRC-32/IEEE checksum.
    #[default]
    Crc32,
    /// First 4 bytes of the BLAKE3 digest, little-endian.
    Blake3,
}

/// Shared handle to the function that maps bytes to a ring position.
///
/// Cloning is an `Arc` bump, so every snapshot builder and reader can hold
/// its own copy.
#[derive(Clone)]
pub struct HashFn(Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>);

impl HashFn {
    /// Wrap a custom hash function.
    ///
    /// The function must be deterministic for the lifetime of the ring:
    /// the same input must always land on the same position.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[u8]) -> u32 + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Hash `data` to a ring position.
    #[inline]
    pub fn hash(&self, data: &[u8]) -> u32 {
        (self.0)(data)
    }
}

impl Default for HashFn {
    fn default() -> Self {
        HashAlgorithm::default().into()
    }
}

impl From<HashAlgorithm> for HashFn {
    fn from(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Crc32 => Self::custom(crc32),
            HashAlgorithm::Blake3 => Self::custom(blake3_u32),
        }
    }
}

impl fmt::Debug for HashFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashFn(..)")
    }
}

/// CRC-32/IEEE of `data`.
pub fn crc32(data: &[u8]) -> u32 {
    CRC32_IEEE.checksum(data)
}

/// BLAKE3 digest of `data` truncated to its first 4 bytes.
pub fn blake3_u32(data: &[u8]) -> u32 {
    let digest = blake3::hash(data);
    let b = digest.as_bytes();
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

/// Input bytes for virtual node `index` of `name`: the decimal index
/// followed by the name, e.g. `"2cache-b"`.
pub fn vnode_label(index: usize, name: &str) -> Vec<u8> {
    let mut label = index.to_string().into_bytes();
    label.extend_from_slice(name.as_bytes());
    label
}
