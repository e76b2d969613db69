//! Path-addressed blob store for binary image artifacts.
//!
//! Supports existence checks, local-to-local copies, and remote downloads.
//! The filesystem implementation downloads with the shared reqwest client
//! and writes straight to the destination path.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;

use super::StoreError;

/// Strip a `file://` scheme so local URIs and plain paths address the same
/// filesystem entry.
fn local_path(uri: &str) -> &str {
    uri.strip_prefix("file://").unwrap_or(uri)
}

/// Async file storage addressed by path. `remove` is idempotent.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Local-to-local copy.
    async fn copy(&self, from: &str, to: &str) -> Result<(), StoreError>;

    /// Remote-to-local download.
    async fn download(&self, uri: &str, to: &str) -> Result<(), StoreError>;

    async fn remove(&self, path: &str) -> Result<(), StoreError>;
}

/// Filesystem blob store. Clone is cheap - reqwest::Client uses Arc
/// internally for connection pooling.
#[derive(Clone)]
pub struct FsBlobStore {
    client: Client,
}

impl FsBlobStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn ensure_parent(path: &str) -> Result<(), StoreError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(local_path(path)).await?)
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), StoreError> {
        let to = local_path(to);
        Self::ensure_parent(to).await?;
        tokio::fs::copy(local_path(from), to).await?;
        debug!(to, "Blob copied");
        Ok(())
    }

    async fn download(&self, uri: &str, to: &str) -> Result<(), StoreError> {
        let response = self.client.get(uri).send().await?;
        if !response.status().is_success() {
            return Err(StoreError::DownloadStatus {
                uri: uri.to_string(),
                status: response.status().as_u16(),
            });
        }
        let bytes = response.bytes().await?;

        let to = local_path(to);
        Self::ensure_parent(to).await?;
        tokio::fs::write(to, &bytes).await?;
        debug!(uri, to, size = bytes.len(), "Blob downloaded");
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(local_path(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory blob store for tests. Counts copy/download invocations so
/// acquisition idempotence can be asserted, and can be told to fail.
#[derive(Default)]
pub struct MemoryBlobStore {
    paths: RwLock<HashSet<String>>,
    copy_calls: AtomicUsize,
    download_calls: AtomicUsize,
    fail_acquisition: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `copy`/`download` calls fail.
    pub fn fail_acquisition(&self, fail: bool) {
        self.fail_acquisition.store(fail, Ordering::SeqCst);
    }

    pub fn copy_calls(&self) -> usize {
        self.copy_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    /// Seed a path as already present.
    pub async fn insert(&self, path: &str) {
        self.paths.write().await.insert(path.to_string());
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.paths.read().await.contains(path))
    }

    async fn copy(&self, _from: &str, to: &str) -> Result<(), StoreError> {
        self.copy_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_acquisition.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("copy failure injected".to_string()));
        }
        self.paths.write().await.insert(to.to_string());
        Ok(())
    }

    async fn download(&self, _uri: &str, to: &str) -> Result<(), StoreError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_acquisition.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("download failure injected".to_string()));
        }
        self.paths.write().await.insert(to.to_string());
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.paths.write().await.remove(path);
        Ok(())
    }
}
