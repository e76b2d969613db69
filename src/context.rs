//! Context wiring for the cache/sync engine.
//!
//! [`DexContext`] assembles the catalog engine, the favorites set, and the
//! image resolver over shared collaborator instances. Consumers receive
//! explicit references to one owned context rather than ambient global
//! state, and every collaborator can be swapped at the trait seam.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use futures::future::join_all;
use tracing::info;

use crate::api::{build_http_client, CatalogClient, CatalogSource};
use crate::config::Config;
use crate::engine::{Catalog, Favorites, ImageResolver};
use crate::models::Record;
use crate::store::{BlobStore, DurableStore, FsBlobStore, FsKvStore};

/// Owns the engine-side state for one catalog session.
///
/// Single logical caller assumed, matching the engine's concurrency model:
/// the presentation loop drives `catalog` and `favorites` directly.
pub struct DexContext {
    pub catalog: Catalog,
    pub favorites: Favorites,
    images: Arc<ImageResolver>,
}

impl DexContext {
    /// Wire the filesystem-backed production collaborators from config.
    pub fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn DurableStore> = Arc::new(
            FsKvStore::new(config.store_dir()?).context("Failed to open durable store")?,
        );
        let http = build_http_client().context("Failed to build HTTP client")?;
        let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(http.clone()));
        let source: Arc<dyn CatalogSource> =
            Arc::new(CatalogClient::with_client(http, config.api_base_url.clone()));

        Ok(Self::with_collaborators(
            store,
            blobs,
            source,
            config.image_dir()?,
        ))
    }

    /// Wire explicit collaborator instances (tests, alternative backends).
    pub fn with_collaborators(
        store: Arc<dyn DurableStore>,
        blobs: Arc<dyn BlobStore>,
        source: Arc<dyn CatalogSource>,
        image_root: PathBuf,
    ) -> Self {
        let images = Arc::new(ImageResolver::new(blobs, image_root));
        let catalog = Catalog::new(store.clone(), source, images.clone());
        let favorites = Favorites::new(store);
        Self {
            catalog,
            favorites,
            images,
        }
    }

    /// One-time startup: load the persisted favorites set and restore
    /// locally created records into the working set.
    pub async fn startup(&mut self) {
        self.favorites.load().await;
        let restored = self.catalog.restore_created().await;
        info!(
            favorites = self.favorites.len(),
            restored, "Context started"
        );
    }

    /// Favorited records from the working set, each paired with a display
    /// URI resolved through the existence-checked fallback chain.
    pub async fn favorite_records(&self) -> Vec<(Record, String)> {
        let favorites: Vec<Record> = self
            .catalog
            .records()
            .iter()
            .filter(|r| self.favorites.is_favorite(r.id))
            .cloned()
            .collect();

        let uris = join_all(favorites.iter().map(|r| self.images.display_uri(r))).await;
        favorites.into_iter().zip(uris).collect()
    }
}
