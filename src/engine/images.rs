//! Image resolution policy.
//!
//! Every record's image artifact lives in the blob store as `<id>.png`
//! under a fixed root. Acquisition is idempotent, and resolution is
//! self-healing: a recorded local path that no longer exists is re-acquired
//! from the remote source on next access instead of surfacing an error.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Record;
use crate::store::{BlobStore, StoreError};

/// Fixed fallback shown when both the local artifact and the remote source
/// are unavailable. Never an error state.
pub const PLACEHOLDER_IMAGE_URI: &str = "asset://placeholder.png";

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("image source URI is empty")]
    InvalidSource,

    #[error("image destination name is empty")]
    InvalidDestination,

    #[error("image copy failed: {0}")]
    Copy(#[source] StoreError),

    #[error("image download failed: {0}")]
    Download(#[source] StoreError),
}

/// Resolves and acquires per-record image artifacts.
pub struct ImageResolver {
    blobs: Arc<dyn BlobStore>,
    root: PathBuf,
}

impl ImageResolver {
    pub fn new(blobs: Arc<dyn BlobStore>, root: PathBuf) -> Self {
        Self { blobs, root }
    }

    /// Deterministic local path for a destination filename.
    pub fn local_dest(&self, dest_name: &str) -> String {
        self.root.join(dest_name).to_string_lossy().into_owned()
    }

    /// A source already on this device is copied; anything with a remote
    /// scheme is downloaded.
    fn is_local_source(source: &str) -> bool {
        source.starts_with("file://") || !source.contains("://")
    }

    async fn exists(&self, path: &str) -> bool {
        match self.blobs.exists(path).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(path, error = %e, "Blob existence check failed");
                false
            }
        }
    }

    /// Acquire a local copy of `source` under `dest_name`, at most once: if
    /// the destination already exists it is returned untouched.
    pub async fn ensure_local_copy(
        &self,
        source: &str,
        dest_name: &str,
    ) -> Result<String, AcquisitionError> {
        if source.trim().is_empty() {
            return Err(AcquisitionError::InvalidSource);
        }
        if dest_name.trim().is_empty() {
            return Err(AcquisitionError::InvalidDestination);
        }

        let dest = self.local_dest(dest_name);
        if self.exists(&dest).await {
            debug!(dest, "Image already cached");
            return Ok(dest);
        }

        if Self::is_local_source(source) {
            self.blobs
                .copy(source, &dest)
                .await
                .map_err(AcquisitionError::Copy)?;
        } else {
            self.blobs
                .download(source, &dest)
                .await
                .map_err(AcquisitionError::Download)?;
        }
        Ok(dest)
    }

    /// Resolve a surfaceable URI for a record, repairing a missing local
    /// artifact in place. Fallback chain: valid local path, re-acquired
    /// local path, remote source, fixed placeholder. Never fails.
    pub async fn resolve(&self, record: &mut Record) -> String {
        if let Some(local) = record.image.local.clone() {
            if self.exists(&local).await {
                return local;
            }
            warn!(id = record.id, path = %local, "Cached image missing, re-acquiring");
        }

        match self
            .ensure_local_copy(&record.image.remote, &record.image_name())
            .await
        {
            Ok(path) => {
                record.image.local = Some(path.clone());
                path
            }
            Err(e) => {
                warn!(id = record.id, error = %e, "Image acquisition failed, falling back");
                if record.image.remote.is_empty() {
                    PLACEHOLDER_IMAGE_URI.to_string()
                } else {
                    record.image.remote.clone()
                }
            }
        }
    }

    /// Remove a record's cached artifact. Idempotent.
    pub async fn remove_artifact(&self, dest_name: &str) -> Result<(), StoreError> {
        self.blobs.remove(&self.local_dest(dest_name)).await
    }

    /// Read-only fallback chain for list rendering: no re-acquisition, no
    /// record mutation.
    pub async fn display_uri(&self, record: &Record) -> String {
        if let Some(ref local) = record.image.local {
            if self.exists(local).await {
                return local.clone();
            }
        }
        if !record.image.remote.is_empty() {
            record.image.remote.clone()
        } else {
            PLACEHOLDER_IMAGE_URI.to_string()
        }
    }
}
