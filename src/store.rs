//! ChunkedSecureStore - size-unbounded text storage on a size-bounded
//! secure key-value backend.
//!
//! Workflow per `put`: payload -> zlib deflate -> split into chunks of at
//! most `chunk_size` bytes -> write chunks under a fresh generation ->
//! commit by overwriting the manifest -> sweep the superseded generation.
//!
//! The manifest is the single commit point: a reader only follows the chunk
//! keys named by the manifest it loaded, so a failed or in-flight `put`
//! leaves the previously committed value fully readable. Callers must still
//! serialize concurrent `put`/`clear` calls on the same logical key; the
//! store takes no locks of its own.

use tracing::{debug, warn};

use crate::backend::SecureStore;
use crate::codec;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::manifest::{Manifest, MANIFEST_VERSION};

/// Chunked, compressed storage for large text payloads under logical keys.
///
/// Generic over the backing [`SecureStore`]; see [`KeyringStore`] for the
/// production backend and [`MemoryStore`] for an in-process one.
///
/// [`KeyringStore`]: crate::backend::KeyringStore
/// [`MemoryStore`]: crate::backend::MemoryStore
pub struct ChunkedSecureStore<S> {
    backend: S,
    config: StoreConfig,
}

impl<S: SecureStore> ChunkedSecureStore<S> {
    /// Create a store with the default configuration.
    pub fn new(backend: S) -> Self {
        Self::with_config(backend, StoreConfig::default())
    }

    /// Create a store with explicit tuning.
    pub fn with_config(backend: S, config: StoreConfig) -> Self {
        Self { backend, config }
    }

    /// The backing store.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    fn manifest_key(logical_key: &str) -> String {
        format!("{logical_key}_manifest")
    }

    fn chunk_key(logical_key: &str, generation: u64, index: u32) -> String {
        format!("{logical_key}_{generation}_{index}")
    }

    /// Store `payload` under `logical_key`, fully replacing any prior value.
    ///
    /// A failure before the manifest commit leaves the previous committed
    /// value readable; the caller may simply retry. After a successful
    /// commit the superseded generation's chunks are deleted best-effort.
    pub async fn put(&self, logical_key: &str, payload: &str) -> Result<(), StoreError> {
        if logical_key.is_empty() {
            return Err(StoreError::InvalidKey);
        }

        let previous = self.load_manifest_lenient(logical_key).await?;
        let generation = previous
            .as_ref()
            .map(|m| m.generation.wrapping_add(1))
            .unwrap_or(0);

        let compressed = codec::compress(payload.as_bytes(), self.config.compression_level)
            .map_err(|e| StoreError::Corruption {
                key: logical_key.to_string(),
                reason: format!("deflate failed: {e}"),
            })?;

        let chunk_size = self.config.chunk_size.max(1);
        let mut chunk_count: u32 = 0;
        for (index, chunk) in compressed.chunks(chunk_size).enumerate() {
            let chunk_key = Self::chunk_key(logical_key, generation, index as u32);
            self.backend
                .set(&chunk_key, chunk)
                .await
                .map_err(|e| StoreError::Write {
                    key: chunk_key.clone(),
                    source: e,
                })?;
            chunk_count += 1;
        }

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            generation,
            chunk_count,
            compressed_len: compressed.len() as u64,
        };
        let manifest_key = Self::manifest_key(logical_key);
        let body = manifest.to_bytes().map_err(|e| StoreError::Corruption {
            key: logical_key.to_string(),
            reason: format!("manifest encoding failed: {e}"),
        })?;
        self.backend
            .set(&manifest_key, &body)
            .await
            .map_err(|e| StoreError::Write {
                key: manifest_key.clone(),
                source: e,
            })?;
        debug!(
            key = logical_key,
            generation, chunk_count, "committed payload"
        );

        // The new value is durable from here on; sweeping the superseded
        // chunks is best-effort and retried by the next put/clear.
        if let Some(old) = previous {
            if let Err(e) = self.delete_generation(logical_key, &old).await {
                warn!(key = logical_key, error = %e, "failed to sweep superseded chunks");
            }
        }
        Ok(())
    }

    /// Read the payload stored under `logical_key`.
    ///
    /// Returns `Ok(None)` for a key that was never written (or was cleared);
    /// a stored empty payload reads back as `Ok(Some(String::new()))`.
    pub async fn get(&self, logical_key: &str) -> Result<Option<String>, StoreError> {
        if logical_key.is_empty() {
            return Err(StoreError::InvalidKey);
        }

        let Some(manifest) = self.load_manifest(logical_key).await? else {
            return Ok(None);
        };

        let mut compressed = Vec::with_capacity(manifest.compressed_len as usize);
        for index in 0..manifest.chunk_count {
            let chunk_key = Self::chunk_key(logical_key, manifest.generation, index);
            let chunk = self
                .backend
                .get(&chunk_key)
                .await
                .map_err(|e| StoreError::Read {
                    key: chunk_key.clone(),
                    source: e,
                })?;
            match chunk {
                Some(bytes) => compressed.extend_from_slice(&bytes),
                None => {
                    return Err(StoreError::Corruption {
                        key: logical_key.to_string(),
                        reason: format!(
                            "chunk {index} of generation {} is missing",
                            manifest.generation
                        ),
                    })
                }
            }
        }

        if compressed.len() as u64 != manifest.compressed_len {
            return Err(StoreError::Corruption {
                key: logical_key.to_string(),
                reason: format!(
                    "reassembled {} bytes, manifest records {}",
                    compressed.len(),
                    manifest.compressed_len
                ),
            });
        }

        let payload = codec::decompress(&compressed).map_err(|e| StoreError::Corruption {
            key: logical_key.to_string(),
            reason: format!("inflate failed: {e}"),
        })?;
        let payload = String::from_utf8(payload).map_err(|_| StoreError::Corruption {
            key: logical_key.to_string(),
            reason: "payload is not valid UTF-8".to_string(),
        })?;
        Ok(Some(payload))
    }

    /// Remove any value stored under `logical_key`.
    ///
    /// Clearing a key with no stored value is a no-op success. The manifest
    /// is deleted first, so the key reads as absent even if a later chunk
    /// delete fails.
    pub async fn clear(&self, logical_key: &str) -> Result<(), StoreError> {
        if logical_key.is_empty() {
            return Err(StoreError::InvalidKey);
        }

        let manifest = self.load_manifest_lenient(logical_key).await?;
        let manifest_key = Self::manifest_key(logical_key);
        self.backend
            .delete(&manifest_key)
            .await
            .map_err(|e| StoreError::Write {
                key: manifest_key.clone(),
                source: e,
            })?;
        if let Some(manifest) = manifest {
            self.delete_generation(logical_key, &manifest).await?;
            debug!(
                key = logical_key,
                generation = manifest.generation,
                "cleared payload"
            );
        }
        Ok(())
    }

    async fn load_manifest(&self, logical_key: &str) -> Result<Option<Manifest>, StoreError> {
        let manifest_key = Self::manifest_key(logical_key);
        let raw = self
            .backend
            .get(&manifest_key)
            .await
            .map_err(|e| StoreError::Read {
                key: manifest_key.clone(),
                source: e,
            })?;
        match raw {
            None => Ok(None),
            Some(bytes) => Manifest::from_bytes(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Corruption {
                    key: logical_key.to_string(),
                    reason: format!("undecodable manifest: {e}"),
                }),
        }
    }

    /// Manifest load for the write path: an undecodable manifest must not
    /// make a key impossible to overwrite or clear, so it is treated as
    /// absent. Chunks of the unknown old generation become unreachable
    /// garbage; later writes overwrite colliding derived keys.
    async fn load_manifest_lenient(
        &self,
        logical_key: &str,
    ) -> Result<Option<Manifest>, StoreError> {
        match self.load_manifest(logical_key).await {
            Ok(manifest) => Ok(manifest),
            Err(StoreError::Corruption { .. }) => {
                warn!(key = logical_key, "replacing undecodable manifest");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_generation(
        &self,
        logical_key: &str,
        manifest: &Manifest,
    ) -> Result<(), StoreError> {
        for index in 0..manifest.chunk_count {
            let chunk_key = Self::chunk_key(logical_key, manifest.generation, index);
            self.backend
                .delete(&chunk_key)
                .await
                .map_err(|e| StoreError::Write {
                    key: chunk_key.clone(),
                    source: e,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;

    fn store() -> ChunkedSecureStore<MemoryStore> {
        ChunkedSecureStore::new(MemoryStore::new())
    }

    fn small_chunk_store(chunk_size: usize) -> ChunkedSecureStore<MemoryStore> {
        ChunkedSecureStore::with_config(
            MemoryStore::new(),
            StoreConfig {
                chunk_size,
                ..StoreConfig::default()
            },
        )
    }

    /// Payload that survives compression at a useful size: a xorshift
    /// stream rendered as printable characters compresses poorly, so a few
    /// kilobytes of it reliably spans multiple chunks.
    fn noisy_payload(len: usize) -> String {
        let mut state: u32 = 0x9e3779b9;
        let mut out = String::with_capacity(len);
        for _ in 0..len {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            out.push(char::from(b' ' + (state % 94) as u8));
        }
        out
    }

    #[tokio::test]
    async fn test_round_trip_short_payload() {
        let store = store();
        store.put("session", "hello world").await.unwrap();
        assert_eq!(
            store.get("session").await.unwrap().as_deref(),
            Some("hello world")
        );
    }

    #[tokio::test]
    async fn test_round_trip_multi_chunk_payload() {
        let store = small_chunk_store(64);
        let payload = noisy_payload(4096);
        store.put("session", &payload).await.unwrap();
        assert_eq!(store.get("session").await.unwrap().as_deref(), Some(payload.as_str()));
        // More than one chunk plus the manifest must be present.
        assert!(store.backend().len() > 2);
    }

    #[tokio::test]
    async fn test_round_trip_empty_payload_is_not_absent() {
        let store = store();
        store.put("session", "").await.unwrap();
        assert_eq!(store.get("session").await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_never_written_key_is_absent() {
        let store = store();
        assert_eq!(store.get("session").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_round_trip_unicode_payload() {
        let store = store();
        let payload = "sésion ユーザー 🗝️";
        store.put("session", payload).await.unwrap();
        assert_eq!(store.get("session").await.unwrap().as_deref(), Some(payload));
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_stale_chunks() {
        let store = small_chunk_store(32);
        store.put("k", &noisy_payload(2048)).await.unwrap();
        store.put("k", "short").await.unwrap();

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("short"));
        // First put committed generation 0; after the sweep nothing of it
        // may remain, only generation 1 chunks and the manifest.
        let keys = store.backend().keys();
        assert!(keys.iter().all(|k| !k.starts_with("k_0_")), "stale: {keys:?}");
        assert!(keys.contains(&"k_manifest".to_string()));
    }

    #[tokio::test]
    async fn test_clear_then_get_is_absent() {
        let store = store();
        store.put("k", "value").await.unwrap();
        store.clear("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.backend().is_empty());
    }

    #[tokio::test]
    async fn test_clear_on_never_written_key_is_noop() {
        let store = store();
        store.clear("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_chunk_boundary_exact_multiple() {
        // chunk_size 1 makes every chunk exactly full, so the chunk count
        // equals the compressed length - the off-by-one boundary case.
        let store = small_chunk_store(1);
        let payload = "boundary check";
        store.put("k", payload).await.unwrap();

        let compressed_len = codec::compress(payload.as_bytes(), 6).unwrap().len();
        assert_eq!(store.backend().len(), compressed_len + 1);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some(payload));
    }

    #[tokio::test]
    async fn test_independent_keys_do_not_interfere() {
        let store = small_chunk_store(64);
        let first = noisy_payload(1024);
        let second = noisy_payload(2048);
        store.put("alpha", &first).await.unwrap();
        store.put("beta", &second).await.unwrap();
        assert_eq!(store.get("alpha").await.unwrap().as_deref(), Some(first.as_str()));
        assert_eq!(store.get("beta").await.unwrap().as_deref(), Some(second.as_str()));
        store.clear("alpha").await.unwrap();
        assert_eq!(store.get("alpha").await.unwrap(), None);
        assert_eq!(store.get("beta").await.unwrap().as_deref(), Some(second.as_str()));
    }

    #[tokio::test]
    async fn test_failed_put_preserves_previous_value() {
        let store = small_chunk_store(32);
        let original = noisy_payload(512);
        store.put("k", &original).await.unwrap();

        // Fail the very first write of the second put.
        store.backend().fail_after_sets(0);
        let err = store.put("k", "replacement").await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));

        store.backend().reset_faults();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some(original.as_str()));
    }

    #[tokio::test]
    async fn test_failed_manifest_commit_preserves_previous_value() {
        let store = store();
        store.put("k", "before").await.unwrap();

        // Let all chunk writes of the next put succeed and fail only the
        // manifest write, the commit point.
        let new_chunks = codec::compress(b"after", 6)
            .unwrap()
            .chunks(2000)
            .count();
        store.backend().fail_after_sets(new_chunks);
        let err = store.put("k", "after").await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));

        store.backend().reset_faults();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("before"));
    }

    #[tokio::test]
    async fn test_backend_read_fault_is_read_error() {
        let store = store();
        store.put("k", "value").await.unwrap();
        store.backend().set_fail_reads(true);
        let err = store.get("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[tokio::test]
    async fn test_missing_chunk_is_corruption() {
        let store = small_chunk_store(16);
        store.put("k", &noisy_payload(256)).await.unwrap();
        assert!(store.backend().remove("k_0_1"));
        let err = store.get("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Corruption { .. }));
    }

    #[tokio::test]
    async fn test_undecodable_manifest_reads_as_corruption_but_is_overwritable() {
        let store = store();
        store.put("k", "value").await.unwrap();
        store
            .backend()
            .set("k_manifest", b"not json")
            .await
            .unwrap();

        let err = store.get("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Corruption { .. }));

        // put must still be able to replace the damaged key.
        store.put("k", "recovered").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("recovered"));
    }

    #[tokio::test]
    async fn test_clear_delete_fault_is_write_error() {
        let store = store();
        store.put("k", "value").await.unwrap();
        store.backend().set_fail_deletes(true);
        let err = store.clear("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[tokio::test]
    async fn test_empty_logical_key_is_rejected() {
        let store = store();
        assert!(matches!(
            store.put("", "v").await.unwrap_err(),
            StoreError::InvalidKey
        ));
        assert!(matches!(
            store.get("").await.unwrap_err(),
            StoreError::InvalidKey
        ));
        assert!(matches!(
            store.clear("").await.unwrap_err(),
            StoreError::InvalidKey
        ));
    }

    #[tokio::test]
    async fn test_chunking_respects_backend_value_ceiling() {
        // A backend that rejects values over 256 bytes, like a real
        // keychain entry limit; chunks of 200 bytes must all fit.
        let store = ChunkedSecureStore::with_config(
            MemoryStore::with_value_ceiling(256),
            StoreConfig {
                chunk_size: 200,
                ..StoreConfig::default()
            },
        );
        let payload = noisy_payload(8192);
        store.put("k", &payload).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some(payload.as_str()));
    }
}
