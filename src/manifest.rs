//! Manifest records - the commit point for each logical key.

use serde::{Deserialize, Serialize};

/// Manifest record format version (for future migrations).
pub(crate) const MANIFEST_VERSION: u32 = 1;

/// Commit record for one logical key.
///
/// Stored as JSON under `"{logical_key}_manifest"`. Readers only ever follow
/// the chunk keys this record names, so a partially written newer generation
/// stays invisible until its manifest overwrites this one, and stale chunks
/// beyond `chunk_count` are unreachable rather than silently concatenated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Manifest {
    /// Record format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Generation whose chunk set is live.
    pub generation: u64,
    /// Number of chunks; indices are `[0, chunk_count)` with no gaps.
    pub chunk_count: u32,
    /// Total compressed length in bytes, validated on reassembly.
    pub compressed_len: u64,
}

fn default_version() -> u32 {
    MANIFEST_VERSION
}

impl Manifest {
    /// Encode to the JSON bytes stored in the backend.
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode a manifest read back from the backend.
    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
