//! Cache/sync engine.
//!
//! [`Catalog`] reconciles the paginated remote source with the per-record
//! durable store and owns the in-memory working set the presentation layer
//! renders. The policy is local-first: once any durable data exists for a
//! page, it is served without touching the network, trading freshness for
//! latency and offline availability.

pub mod favorites;
pub mod images;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::CatalogSource;
use crate::models::{
    image_name, record_key, RawRecord, Record, RecordDraft, RecordImage, RecordName, RecordPatch,
};
use crate::store::{DurableStore, StoreError};

pub use favorites::{Favorites, FAVORITES_KEY};
pub use images::{AcquisitionError, ImageResolver, PLACEHOLDER_IMAGE_URI};

// ============================================================================
// Constants
// ============================================================================

/// Fixed page size for both the durable-store probe range and remote fetches.
pub const PAGE_SIZE: usize = 10;

/// Durable-store key for the sorted list of all persisted record ids.
/// Maintained on every persist/delete so locally created records can be
/// restored at startup without a remote round-trip.
pub const RECORD_INDEX_KEY: &str = "record_index";

/// Ids at or above this floor are timestamp-assigned (created locally).
/// Catalog ids are small and dense; timestamp ids are milliseconds since
/// the epoch and never overlap the dense probe space.
const CREATED_ID_FLOOR: i64 = 1_000_000_000_000;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("profile not found: {0}")]
    NotFound(i64),

    #[error("invalid draft: {0}")]
    InvalidDraft(&'static str),
}

/// The cache/sync engine. Owns the working set exclusively; the durable
/// store, blob store, and remote source are shared collaborators reached
/// through their async contracts.
///
/// Not internally synchronized: callers are expected to be a single
/// user-paced presentation loop, so read-modify-write sequences on the
/// working set are not transactional.
pub struct Catalog {
    store: Arc<dyn DurableStore>,
    source: Arc<dyn CatalogSource>,
    images: Arc<ImageResolver>,
    records: Vec<Record>,
    has_more: bool,
    page_size: usize,
}

impl Catalog {
    pub fn new(
        store: Arc<dyn DurableStore>,
        source: Arc<dyn CatalogSource>,
        images: Arc<ImageResolver>,
    ) -> Self {
        Self {
            store,
            source,
            images,
            records: Vec::new(),
            has_more: true,
            page_size: PAGE_SIZE,
        }
    }

    // ===== Working-set views =====

    /// The deduplicated, ordered working set.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether further pages may exist. Becomes false once a remote page
    /// comes back short and never flips back.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Working-set records matching a category filter; `None` means all.
    pub fn records_by_category(&self, category: Option<&str>) -> Vec<&Record> {
        match category {
            Some(category) => self
                .records
                .iter()
                .filter(|r| r.has_category(category))
                .collect(),
            None => self.records.iter().collect(),
        }
    }

    // ===== Page loading =====

    /// Load a 1-based page into the working set and return the merged set.
    ///
    /// The durable store is probed first across the page's expected id
    /// range; any hit short-circuits the remote fetch for this call. A
    /// remote failure aborts the call with the working set and `has_more`
    /// untouched.
    pub async fn load_page(&mut self, page: u32) -> Result<&[Record]> {
        anyhow::ensure!(page >= 1, "page numbers are 1-based");

        let start = (page as i64 - 1) * self.page_size as i64;
        let keys: Vec<String> = (0..self.page_size as i64)
            .map(|i| record_key(start + i))
            .collect();

        let probes = keys.iter().map(|key| self.probe(key));
        let hits: Vec<Record> = join_all(probes).await.into_iter().flatten().collect();

        if !hits.is_empty() {
            debug!(page, hits = hits.len(), "Serving page from durable store");
            self.merge(hits);
            return Ok(&self.records);
        }

        let raw = self
            .source
            .fetch_page(page, self.page_size)
            .await
            .with_context(|| format!("Failed to fetch catalog page {}", page))?;

        if raw.len() < self.page_size && self.has_more {
            info!(page, count = raw.len(), "Catalog exhausted");
            self.has_more = false;
        }

        let normalized = join_all(raw.into_iter().map(|r| self.normalize(r))).await;
        let batch: Vec<Record> = normalized.into_iter().flatten().collect();
        debug!(page, count = batch.len(), "Remote page normalized");

        self.merge(batch);
        Ok(&self.records)
    }

    /// Read one record from the durable store, treating unreadable or
    /// malformed entries as absent.
    async fn probe(&self, key: &str) -> Option<Record> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Durable store probe failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(key, error = %e, "Malformed stored record, treating as absent");
                None
            }
        }
    }

    /// Normalize a raw remote record: validate the shape, acquire its image
    /// artifact, persist it. Image and persistence failures degrade (the
    /// record is still served); a malformed record is dropped.
    async fn normalize(&self, raw: RawRecord) -> Option<Record> {
        let mut record = match raw.into_record() {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Dropping malformed remote record");
                return None;
            }
        };

        match self
            .images
            .ensure_local_copy(&record.image.remote, &record.image_name())
            .await
        {
            Ok(path) => record.image.local = Some(path),
            Err(e) => {
                warn!(id = record.id, error = %e, "Image acquisition failed");
            }
        }

        if let Err(e) = self.persist(&record).await {
            warn!(id = record.id, error = %e, "Failed to persist record");
        }
        Some(record)
    }

    /// Append a batch, dropping incoming duplicates: entries already in the
    /// working set always win and keep their positions.
    fn merge(&mut self, batch: Vec<Record>) {
        for record in batch {
            if self.records.iter().any(|r| r.id == record.id) {
                continue;
            }
            self.records.push(record);
        }
    }

    // ===== Edit operations =====

    /// Merge a patch into the stored record and replace the working-set
    /// entry in place. On a store failure the working set is unchanged.
    pub async fn update_record(&mut self, id: i64, patch: &RecordPatch) -> Result<Record> {
        let raw = self
            .store
            .get(&record_key(id))
            .await
            .context("Failed to read record for edit")?
            .ok_or(CatalogError::NotFound(id))?;
        let mut record: Record =
            serde_json::from_str(&raw).map_err(|_| CatalogError::NotFound(id))?;

        record.apply_patch(patch);
        self.persist(&record)
            .await
            .context("Failed to persist record edit")?;

        if let Some(slot) = self.records.iter_mut().find(|r| r.id == id) {
            *slot = record.clone();
        }
        Ok(record)
    }

    /// Remove a record from the durable store, the working set, and the
    /// blob store. Blob cleanup failure is logged, not surfaced.
    pub async fn delete_record(&mut self, id: i64) -> Result<()> {
        self.store
            .remove(&record_key(id))
            .await
            .context("Failed to delete record")?;
        self.index_remove(id).await;

        if let Err(e) = self.images.remove_artifact(&image_name(id)).await {
            warn!(id, error = %e, "Failed to remove image artifact");
        }

        self.records.retain(|r| r.id != id);
        Ok(())
    }

    /// Create a record with a timestamp-assigned id, acquire its image,
    /// persist it, and move it to the top of the working set (the set is
    /// re-sorted newest-first).
    pub async fn create_record(&mut self, draft: RecordDraft) -> Result<Record> {
        if draft.name.trim().is_empty() {
            return Err(CatalogError::InvalidDraft("name must not be empty").into());
        }
        if draft.types.is_empty() {
            return Err(CatalogError::InvalidDraft("at least one category is required").into());
        }

        let id = Utc::now().timestamp_millis();
        let mut record = Record {
            id,
            name: RecordName {
                english: draft.name,
                ..Default::default()
            },
            types: draft.types,
            description: None,
            profile: None,
            image: RecordImage {
                remote: draft.image_source.clone().unwrap_or_default(),
                local: None,
            },
        };

        if let Some(source) = draft.image_source.filter(|s| !s.trim().is_empty()) {
            match self
                .images
                .ensure_local_copy(&source, &record.image_name())
                .await
            {
                Ok(path) => record.image.local = Some(path),
                Err(e) => {
                    warn!(id, error = %e, "Image acquisition failed for created record");
                }
            }
        }

        self.persist(&record)
            .await
            .context("Failed to persist created record")?;

        self.records.insert(0, record.clone());
        self.records.sort_by(|a, b| b.id.cmp(&a.id));
        info!(id, "Record created");
        Ok(record)
    }

    /// Read a record for the detail view. Runs the self-healing image
    /// resolution and persists a repaired local path. Absent (or
    /// unreadable) entries surface as [`CatalogError::NotFound`].
    pub async fn get_record(&mut self, id: i64) -> Result<Record> {
        let raw = self
            .store
            .get(&record_key(id))
            .await
            .context("Failed to read record")?
            .ok_or(CatalogError::NotFound(id))?;
        let mut record: Record =
            serde_json::from_str(&raw).map_err(|_| CatalogError::NotFound(id))?;

        let before = record.image.local.clone();
        self.images.resolve(&mut record).await;

        if record.image.local != before {
            if let Err(e) = self.persist(&record).await {
                warn!(id, error = %e, "Failed to persist repaired image path");
            }
            if let Some(slot) = self.records.iter_mut().find(|r| r.id == id) {
                slot.image.local = record.image.local.clone();
            }
        }
        Ok(record)
    }

    // ===== Startup restore =====

    /// Restore locally created records (timestamp ids) from the durable
    /// store into the working set. Their ids fall outside every page's
    /// probe range, so without this they would never resurface after a
    /// cold start. Returns the number of records restored.
    pub async fn restore_created(&mut self) -> usize {
        let created: Vec<i64> = self
            .read_index()
            .await
            .into_iter()
            .filter(|&id| id >= CREATED_ID_FLOOR)
            .collect();
        if created.is_empty() {
            return 0;
        }

        let keys: Vec<String> = created.iter().map(|&id| record_key(id)).collect();
        let probes = keys.iter().map(|key| self.probe(key));
        let hits: Vec<Record> = join_all(probes).await.into_iter().flatten().collect();
        let count = hits.len();

        self.merge(hits);
        self.records.sort_by(|a, b| b.id.cmp(&a.id));
        if count > 0 {
            info!(count, "Restored locally created records");
        }
        count
    }

    // ===== Persistence =====

    /// Serialize and write a record, keeping the id index in step. Index
    /// maintenance is best-effort.
    async fn persist(&self, record: &Record) -> Result<(), StoreError> {
        let payload = serde_json::to_string(record)?;
        self.store.set(&record.key(), &payload).await?;
        self.index_add(record.id).await;
        Ok(())
    }

    async fn read_index(&self) -> Vec<i64> {
        match self.store.get(RECORD_INDEX_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(error = %e, "Malformed record index, rebuilding");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read record index");
                Vec::new()
            }
        }
    }

    async fn write_index(&self, ids: &[i64]) {
        let payload = match serde_json::to_string(ids) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize record index");
                return;
            }
        };
        if let Err(e) = self.store.set(RECORD_INDEX_KEY, &payload).await {
            warn!(error = %e, "Failed to persist record index");
        }
    }

    async fn index_add(&self, id: i64) {
        let mut ids = self.read_index().await;
        if let Err(slot) = ids.binary_search(&id) {
            ids.insert(slot, id);
            self.write_index(&ids).await;
        }
    }

    async fn index_remove(&self, id: i64) {
        let mut ids = self.read_index().await;
        if let Ok(slot) = ids.binary_search(&id) {
            ids.remove(slot);
            self.write_index(&ids).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use crate::api::ApiError;
    use crate::store::{BlobStore, MemoryBlobStore, MemoryKvStore};

    /// Scripted catalog source: serves the configured pages and counts
    /// invocations so the local-first short-circuit can be asserted.
    struct StubSource {
        pages: Vec<Vec<serde_json::Value>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubSource {
        fn new(pages: Vec<Vec<serde_json::Value>>) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                pages: Vec::new(),
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl crate::api::CatalogSource for StubSource {
        async fn fetch_page(&self, page: u32, _limit: usize) -> Result<Vec<RawRecord>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::ServerError("boom".to_string()));
            }
            let values = self
                .pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_default();
            Ok(values
                .into_iter()
                .map(|v| serde_json::from_value(v).expect("stub record"))
                .collect())
        }
    }

    struct Harness {
        store: Arc<MemoryKvStore>,
        blobs: Arc<MemoryBlobStore>,
        source: Arc<StubSource>,
        catalog: Catalog,
    }

    fn harness(source: StubSource) -> Harness {
        let store = Arc::new(MemoryKvStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let source = Arc::new(source);
        let images = Arc::new(ImageResolver::new(blobs.clone(), PathBuf::from("/images")));
        let catalog = Catalog::new(store.clone(), source.clone(), images);
        Harness {
            store,
            blobs,
            source,
            catalog,
        }
    }

    fn raw_json(id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": { "english": name },
            "type": ["Grass"],
            "image": { "hires": format!("http://img/{}.png", id) }
        })
    }

    fn full_page(start: i64) -> Vec<serde_json::Value> {
        (start..start + 10)
            .map(|id| raw_json(id, &format!("Mon-{}", id)))
            .collect()
    }

    async fn seed_record(store: &MemoryKvStore, id: i64, name: &str) {
        let record = Record {
            id,
            name: RecordName {
                english: name.to_string(),
                ..Default::default()
            },
            types: vec!["Water".to_string()],
            description: None,
            profile: None,
            image: RecordImage {
                remote: format!("http://img/{}.png", id),
                local: None,
            },
        };
        store
            .set(&record.key(), &serde_json::to_string(&record).expect("seed"))
            .await
            .expect("seed set");
    }

    #[tokio::test]
    async fn test_local_hits_short_circuit_remote_fetch() {
        let mut h = harness(StubSource::new(vec![full_page(0)]));
        seed_record(&h.store, 3, "Cached").await;

        let records = h.catalog.load_page(1).await.expect("load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 3);
        assert_eq!(h.source.calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_fetch_normalizes_and_persists() {
        let mut h = harness(StubSource::new(vec![full_page(0)]));

        let records = h.catalog.load_page(1).await.expect("load");
        assert_eq!(records.len(), 10);

        // Result order matches the remote page order.
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());

        assert!(h.catalog.has_more());
        assert_eq!(h.source.calls(), 1);

        // Every record was persisted with its acquired image path.
        let stored = h.store.get("record_4").await.expect("get").expect("stored");
        let record: Record = serde_json::from_str(&stored).expect("parse");
        assert_eq!(record.image.local.as_deref(), Some("/images/4.png"));
        assert_eq!(h.blobs.download_calls(), 10);
    }

    #[tokio::test]
    async fn test_short_page_disables_pagination_permanently() {
        let pages = vec![
            vec![raw_json(0, "Only"), raw_json(1, "Two")],
            full_page(10),
        ];
        let mut h = harness(StubSource::new(pages));

        h.catalog.load_page(1).await.expect("load page 1");
        assert!(!h.catalog.has_more());

        // A later full page must not re-enable pagination.
        h.catalog.load_page(2).await.expect("load page 2");
        assert!(!h.catalog.has_more());
        assert_eq!(h.catalog.len(), 12);
    }

    #[tokio::test]
    async fn test_merge_dedups_and_preserves_positions() {
        let mut h = harness(StubSource::new(vec![]));
        seed_record(&h.store, 1, "One").await;
        seed_record(&h.store, 2, "Two").await;
        seed_record(&h.store, 3, "Three").await;

        h.catalog.load_page(1).await.expect("first load");
        assert_eq!(
            h.catalog.records().iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        // A later probe of the same page turns up an extra record.
        seed_record(&h.store, 4, "Four").await;
        h.catalog.load_page(1).await.expect("second load");
        assert_eq!(
            h.catalog.records().iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[tokio::test]
    async fn test_remote_failure_leaves_state_untouched() {
        let mut h = harness(StubSource::failing());

        let err = h.catalog.load_page(1).await.unwrap_err();
        assert!(err.to_string().contains("page 1"));
        assert!(h.catalog.is_empty());
        assert!(h.catalog.has_more());
    }

    #[tokio::test]
    async fn test_malformed_remote_records_are_dropped() {
        let page = vec![
            raw_json(0, "Good"),
            json!({ "name": { "english": "NoId" } }),
            json!({ "id": 2 }),
            raw_json(3, "AlsoGood"),
        ];
        let mut h = harness(StubSource::new(vec![page]));

        let records = h.catalog.load_page(1).await.expect("load");
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 3]);
    }

    #[tokio::test]
    async fn test_acquisition_failure_degrades_to_no_local_copy() {
        let mut h = harness(StubSource::new(vec![vec![raw_json(0, "Mon")]]));
        h.blobs.fail_acquisition(true);

        let records = h.catalog.load_page(1).await.expect("load");
        assert_eq!(records[0].image.local, None);
        assert_eq!(records[0].image.remote, "http://img/0.png");
    }

    #[tokio::test]
    async fn test_update_record_replaces_in_place() {
        let mut h = harness(StubSource::new(vec![]));
        seed_record(&h.store, 1, "One").await;
        seed_record(&h.store, 2, "Two").await;
        h.catalog.load_page(1).await.expect("load");

        let patch = RecordPatch {
            name_english: Some("Renamed".to_string()),
            description: Some("Edited locally".to_string()),
            ..Default::default()
        };
        let updated = h.catalog.update_record(1, &patch).await.expect("update");
        assert_eq!(updated.name.english, "Renamed");

        // Position preserved, edit visible in the working set.
        assert_eq!(h.catalog.records()[0].id, 1);
        assert_eq!(h.catalog.records()[0].name.english, "Renamed");

        // And in the durable store.
        let stored = h.store.get("record_1").await.expect("get").expect("stored");
        assert!(stored.contains("Renamed"));
    }

    #[tokio::test]
    async fn test_update_store_failure_leaves_working_set_unchanged() {
        let mut h = harness(StubSource::new(vec![]));
        seed_record(&h.store, 1, "One").await;
        h.catalog.load_page(1).await.expect("load");

        h.store.fail_writes(true);
        let patch = RecordPatch {
            name_english: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(h.catalog.update_record(1, &patch).await.is_err());
        assert_eq!(h.catalog.records()[0].name.english, "One");
    }

    #[tokio::test]
    async fn test_update_absent_record_is_not_found() {
        let mut h = harness(StubSource::new(vec![]));
        let err = h
            .catalog
            .update_record(99, &RecordPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogError>(),
            Some(CatalogError::NotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_delete_record_cleans_store_blob_and_working_set() {
        let mut h = harness(StubSource::new(vec![vec![raw_json(0, "Mon")]]));
        h.catalog.load_page(1).await.expect("load");
        assert!(h.blobs.exists("/images/0.png").await.expect("exists"));

        h.catalog.delete_record(0).await.expect("delete");

        assert!(h.catalog.is_empty());
        assert_eq!(h.store.get("record_0").await.expect("get"), None);
        assert!(!h.blobs.exists("/images/0.png").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_create_record_assigns_timestamp_id_and_sorts_newest_first() {
        let mut h = harness(StubSource::new(vec![]));
        seed_record(&h.store, 1, "One").await;
        h.catalog.load_page(1).await.expect("load");

        let created = h
            .catalog
            .create_record(RecordDraft {
                name: "Test".to_string(),
                types: vec!["Fire".to_string()],
                image_source: Some("http://x/y.png".to_string()),
            })
            .await
            .expect("create");

        assert!(created.id >= CREATED_ID_FLOOR);
        assert_eq!(h.catalog.records()[0].id, created.id);
        assert_eq!(
            created.image.local.as_deref(),
            Some(format!("/images/{}.png", created.id).as_str())
        );

        let stored = h
            .store
            .get(&record_key(created.id))
            .await
            .expect("get")
            .expect("stored");
        let record: Record = serde_json::from_str(&stored).expect("parse");
        assert_eq!(record.name.english, "Test");
        assert_eq!(record.image.local, created.image.local);
    }

    #[tokio::test]
    async fn test_create_record_copies_local_sources() {
        let mut h = harness(StubSource::new(vec![]));

        h.catalog
            .create_record(RecordDraft {
                name: "Picked".to_string(),
                types: vec!["Normal".to_string()],
                image_source: Some("file:///picked/selected-image.png".to_string()),
            })
            .await
            .expect("create");

        assert_eq!(h.blobs.copy_calls(), 1);
        assert_eq!(h.blobs.download_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_record_validates_draft() {
        let mut h = harness(StubSource::new(vec![]));

        let missing_name = h
            .catalog
            .create_record(RecordDraft {
                name: "  ".to_string(),
                types: vec!["Fire".to_string()],
                image_source: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            missing_name.downcast_ref::<CatalogError>(),
            Some(CatalogError::InvalidDraft(_))
        ));

        let missing_type = h
            .catalog
            .create_record(RecordDraft {
                name: "Test".to_string(),
                types: vec![],
                image_source: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            missing_type.downcast_ref::<CatalogError>(),
            Some(CatalogError::InvalidDraft(_))
        ));
    }

    #[tokio::test]
    async fn test_created_records_resurface_after_restart() {
        let mut h = harness(StubSource::new(vec![]));
        seed_record(&h.store, 1, "Dense").await;
        h.catalog.load_page(1).await.expect("load");

        let created = h
            .catalog
            .create_record(RecordDraft {
                name: "Mine".to_string(),
                types: vec!["Fire".to_string()],
                image_source: None,
            })
            .await
            .expect("create");

        // Cold restart: fresh engine over the same stores.
        let images = Arc::new(ImageResolver::new(h.blobs.clone(), PathBuf::from("/images")));
        let mut restarted = Catalog::new(h.store.clone(), h.source.clone(), images);
        let restored = restarted.restore_created().await;

        assert_eq!(restored, 1);
        assert_eq!(restarted.records()[0].id, created.id);
        // Dense catalog records are left to normal page loading.
        assert_eq!(restarted.len(), 1);
    }

    #[tokio::test]
    async fn test_get_record_not_found_for_stale_link() {
        let mut h = harness(StubSource::new(vec![]));
        let err = h.catalog.get_record(42).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogError>(),
            Some(CatalogError::NotFound(42))
        ));
    }

    #[tokio::test]
    async fn test_get_record_heals_missing_image_and_persists() {
        let mut h = harness(StubSource::new(vec![vec![raw_json(0, "Mon")]]));
        h.catalog.load_page(1).await.expect("load");

        // Out-of-band artifact loss.
        h.blobs.remove("/images/0.png").await.expect("remove");

        let record = h.catalog.get_record(0).await.expect("get");
        assert_eq!(record.image.local.as_deref(), Some("/images/0.png"));
        assert!(h.blobs.exists("/images/0.png").await.expect("exists"));

        // The repaired path was persisted, not just patched in memory.
        let stored = h.store.get("record_0").await.expect("get").expect("stored");
        let stored: Record = serde_json::from_str(&stored).expect("parse");
        assert_eq!(stored.image.local.as_deref(), Some("/images/0.png"));
    }

    #[tokio::test]
    async fn test_records_by_category_with_null_filter() {
        let page = vec![
            raw_json(0, "Grassy"),
            json!({ "id": 1, "name": { "english": "Untyped" } }),
        ];
        let mut h = harness(StubSource::new(vec![page]));
        h.catalog.load_page(1).await.expect("load");

        let grass = h.catalog.records_by_category(Some("Grass"));
        assert_eq!(grass.len(), 1);
        assert_eq!(grass[0].id, 0);

        let untyped = h.catalog.records_by_category(Some(crate::models::NULL_CATEGORY));
        assert_eq!(untyped.len(), 1);
        assert_eq!(untyped[0].id, 1);

        assert_eq!(h.catalog.records_by_category(None).len(), 2);
    }
}
