//! Persistence collaborators: the string-keyed durable store and the
//! path-addressed blob store.
//!
//! Both are narrow async contracts the engine consumes through trait
//! objects, with filesystem-backed production implementations and in-memory
//! doubles for tests.

pub mod blob;
pub mod kv;

use thiserror::Error;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use kv::{DurableStore, FsKvStore, MemoryKvStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("download of {uri} returned status {status}")]
    DownloadStatus { uri: String, status: u16 },

    #[error("store backend failure: {0}")]
    Backend(String),
}
