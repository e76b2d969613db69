//! dexcache - an offline-first catalog cache.
//!
//! This crate is the engine behind a catalog browser backed by a remote
//! paginated API: it reconciles fetched pages with a per-record durable
//! store (local edits win over stale remote data), keeps on-device image
//! artifacts addressed by record id with self-healing re-acquisition, and
//! maintains a durable favorites set.
//!
//! Presentation, navigation, and form editing live elsewhere; they drive
//! this crate through [`context::DexContext`] and the engine operations it
//! owns (`load_page`, `update_record`, `delete_record`, `create_record`,
//! `get_record`, `is_favorite`, `toggle`).

pub mod api;
pub mod config;
pub mod context;
pub mod engine;
pub mod models;
pub mod store;

pub use api::{ApiError, CatalogClient, CatalogSource};
pub use config::Config;
pub use context::DexContext;
pub use engine::{
    AcquisitionError, Catalog, CatalogError, Favorites, ImageResolver, PAGE_SIZE,
    PLACEHOLDER_IMAGE_URI,
};
pub use models::{Record, RecordDraft, RecordPatch};
pub use store::{BlobStore, DurableStore, StoreError};
