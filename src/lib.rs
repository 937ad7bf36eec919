//! chunkvault - chunked, compressed storage for large secrets.
//!
//! Secure key-value stores (OS keychains, mobile secure stores) cap the size
//! of a single entry, which makes them awkward for anything bigger than a
//! password - a serialized session object, for example. chunkvault stores an
//! arbitrarily large text payload under one logical key by compressing it,
//! splitting the compressed bytes into bounded chunks, and committing the
//! chunk set through a small manifest record:
//!
//! - Deflate the payload (zlib via flate2)
//! - Write chunks under derived keys for a fresh generation
//! - Commit by writing the manifest, then sweep the superseded chunks
//!
//! Reads follow only the chunk keys the manifest names, so an interrupted
//! write never tears the previously committed value. All persistence goes
//! through the [`SecureStore`] trait; [`KeyringStore`] is the production
//! backend and [`MemoryStore`] serves tests and embedding.
//!
//! ```no_run
//! use chunkvault::{ChunkedSecureStore, KeyringStore};
//!
//! # async fn demo() -> Result<(), chunkvault::StoreError> {
//! let store = ChunkedSecureStore::new(KeyringStore::new("my-app"));
//! store.put("session", "{\"user\":\"ada\"}").await?;
//! let session = store.get("session").await?;
//! store.clear("session").await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod codec;
pub mod config;
pub mod error;
mod manifest;
pub mod store;

// Re-export main types
pub use backend::{KeyringStore, MemoryStore, SecureStore};
pub use config::StoreConfig;
pub use error::{BackendError, StoreError};
pub use store::ChunkedSecureStore;
