//! OS keychain backend.
//!
//! Stores each derived key as a credential in the platform keychain
//! (Keychain on macOS, Credential Manager on Windows, kernel keyutils on
//! Linux). These stores cap the size of a single credential, so large
//! payloads must go through the chunked store rather than a raw entry.
//!
//! The keyring API is blocking; calls are bridged onto the runtime's
//! blocking pool, so this backend must be used from within a Tokio runtime.

use async_trait::async_trait;
use keyring::Entry;
use tokio::task;

use super::SecureStore;
use crate::error::BackendError;

/// [`SecureStore`] backed by the platform keychain via the `keyring` crate.
///
/// All derived keys are stored as users under a single service name, so one
/// store instance namespaces its entries away from other applications.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    /// Create a store whose entries live under the given keychain service.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// The keychain service name entries are stored under.
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(service: &str, key: &str) -> Result<Entry, BackendError> {
        Entry::new(service, key).map_err(|e| BackendError::new(e.to_string()))
    }
}

#[async_trait]
impl SecureStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let service = self.service.clone();
        let key = key.to_string();
        task::spawn_blocking(move || {
            let entry = Self::entry(&service, &key)?;
            match entry.get_secret() {
                Ok(bytes) => Ok(Some(bytes)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(BackendError::new(e.to_string())),
            }
        })
        .await
        .map_err(|e| BackendError::new(format!("keyring task failed: {e}")))?
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        let service = self.service.clone();
        let key = key.to_string();
        let value = value.to_vec();
        task::spawn_blocking(move || {
            let entry = Self::entry(&service, &key)?;
            entry
                .set_secret(&value)
                .map_err(|e| BackendError::new(e.to_string()))
        })
        .await
        .map_err(|e| BackendError::new(format!("keyring task failed: {e}")))?
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let service = self.service.clone();
        let key = key.to_string();
        task::spawn_blocking(move || {
            let entry = Self::entry(&service, &key)?;
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(BackendError::new(e.to_string())),
            }
        })
        .await
        .map_err(|e| BackendError::new(format!("keyring task failed: {e}")))?
    }
}
