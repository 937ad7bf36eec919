//! In-memory backend for tests and embedding.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::SecureStore;
use crate::error::BackendError;

#[derive(Default)]
struct Faults {
    /// `Some(n)`: the next `n` sets succeed, then every set fails.
    sets_until_failure: Option<usize>,
    fail_reads: bool,
    fail_deletes: bool,
}

/// [`SecureStore`] held in process memory.
///
/// Not durable; exists for tests and for embedding the chunked store where
/// persistence is handled elsewhere. Optionally enforces a per-key value
/// ceiling like a real keychain, and supports fault injection so error paths
/// can be exercised deterministically.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    faults: Mutex<Faults>,
    value_ceiling: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store with no value ceiling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects values larger than `ceiling` bytes,
    /// mimicking a real keychain's per-entry limit.
    pub fn with_value_ceiling(ceiling: usize) -> Self {
        Self {
            value_ceiling: Some(ceiling),
            ..Self::default()
        }
    }

    /// Let the next `n` sets succeed, then fail every following set.
    pub fn fail_after_sets(&self, n: usize) {
        self.faults.lock().unwrap().sets_until_failure = Some(n);
    }

    /// Make every get fail (as a backend fault, not absence).
    pub fn set_fail_reads(&self, fail: bool) {
        self.faults.lock().unwrap().fail_reads = fail;
    }

    /// Make every delete fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.faults.lock().unwrap().fail_deletes = fail;
    }

    /// Clear all injected faults.
    pub fn reset_faults(&self) {
        *self.faults.lock().unwrap() = Faults::default();
    }

    /// Snapshot of all stored keys, unordered.
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a key behind the store's back, simulating lost data.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        if self.faults.lock().unwrap().fail_reads {
            return Err(BackendError::new("injected read failure"));
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        if let Some(ceiling) = self.value_ceiling {
            if value.len() > ceiling {
                return Err(BackendError::new(format!(
                    "value of {} bytes exceeds backend limit of {} bytes",
                    value.len(),
                    ceiling
                )));
            }
        }
        {
            let mut faults = self.faults.lock().unwrap();
            if let Some(remaining) = faults.sets_until_failure.as_mut() {
                if *remaining == 0 {
                    return Err(BackendError::new("injected write failure"));
                }
                *remaining -= 1;
            }
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        if self.faults.lock().unwrap().fail_deletes {
            return Err(BackendError::new("injected delete failure"));
        }
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ceiling_rejects_oversized_values() {
        let store = MemoryStore::with_value_ceiling(8);
        assert!(store.set("k", b"12345678").await.is_ok());
        assert!(store.set("k", b"123456789").await.is_err());
    }

    #[tokio::test]
    async fn test_absent_key_is_none_not_error() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.set("k", b"v").await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_fail_after_sets_counts_down() {
        let store = MemoryStore::new();
        store.fail_after_sets(1);
        assert!(store.set("a", b"1").await.is_ok());
        assert!(store.set("b", b"2").await.is_err());
        store.reset_faults();
        assert!(store.set("b", b"2").await.is_ok());
    }
}
