//! Error types for chunkvault.

use thiserror::Error;

/// Error reported by a [`SecureStore`](crate::backend::SecureStore) backend.
///
/// Backends differ widely (OS keychains, mobile secure stores, test doubles),
/// so this is an opaque message rather than a backend-specific enum.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    /// Wrap a backend failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`ChunkedSecureStore`](crate::ChunkedSecureStore)
/// operations.
///
/// The store performs no retries and no silent recovery; every failure is
/// reported to the caller, who owns any retry policy.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store rejected a set or delete.
    #[error("write to secure storage failed for key '{key}': {source}")]
    Write {
        /// Derived key whose write failed.
        key: String,
        #[source]
        source: BackendError,
    },

    /// The backing store rejected a get for a reason other than absence.
    #[error("read from secure storage failed for key '{key}': {source}")]
    Read {
        /// Derived key whose read failed.
        key: String,
        #[source]
        source: BackendError,
    },

    /// Stored data could not be reassembled into the original payload.
    ///
    /// Indicates a torn or damaged chunk set: a chunk named by a committed
    /// manifest is missing, the reassembled bytes fail decompression, or the
    /// manifest record itself is undecodable.
    #[error("stored data for key '{key}' is corrupt: {reason}")]
    Corruption {
        /// Logical key whose data is damaged.
        key: String,
        reason: String,
    },

    /// The logical key is empty.
    #[error("logical key must be non-empty")]
    InvalidKey,
}
