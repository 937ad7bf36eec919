//! Backing key-value stores.
//!
//! A [`SecureStore`] is the durable, secure, per-key primitive the chunked
//! store is layered on: an OS keychain, a mobile secure store, or an
//! in-memory double for tests. Values persist across process restarts
//! (except for [`MemoryStore`]) and each key carries a bounded value size,
//! which is the reason chunking exists at all.

pub mod keyring;
pub mod memory;

pub use self::keyring::KeyringStore;
pub use self::memory::MemoryStore;

use async_trait::async_trait;

use crate::error::BackendError;

/// A durable, secure key-value store with a bounded per-key value size.
///
/// Individual key operations are trusted to be atomic and internally
/// serialized by the backend; the chunked store layers no locking on top.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Get the value for a key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// Set a key to a value, overwriting any previous value.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), BackendError>;

    /// Delete a key. Deleting an absent key is a no-op success.
    async fn delete(&self, key: &str) -> Result<(), BackendError>;
}
