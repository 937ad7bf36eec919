//! Store configuration.

use serde::{Deserialize, Serialize};

/// Tuning for a [`ChunkedSecureStore`](crate::ChunkedSecureStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum bytes stored under one derived chunk key.
    ///
    /// Must stay below the backend's per-key value ceiling (the manifest
    /// record, around a hundred bytes of JSON, must fit too). The default
    /// matches the 2000-character chunk size the session blobs were
    /// originally split at.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Deflate compression level, 0 (none) to 9 (best).
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

fn default_chunk_size() -> usize {
    2000
}

fn default_compression_level() -> u32 {
    6
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            compression_level: default_compression_level(),
        }
    }
}
