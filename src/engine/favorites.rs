//! Durable favorites set.
//!
//! Membership changes are visible immediately; persistence is a full
//! rewrite of the serialized id list on every toggle. A failed persist is
//! reported but never rolls the in-memory flip back - the durable copy
//! catches up on the next successful toggle, and in-memory state is
//! authoritative until the next cold start.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::store::DurableStore;

/// Durable-store key for the serialized favorites set.
pub const FAVORITES_KEY: &str = "favorites";

pub struct Favorites {
    store: Arc<dyn DurableStore>,
    ids: HashSet<i64>,
}

impl Favorites {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            store,
            ids: HashSet::new(),
        }
    }

    /// One-time startup load. A missing entry starts empty; a malformed or
    /// unreadable entry is logged and also starts empty.
    pub async fn load(&mut self) {
        match self.store.get(FAVORITES_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<i64>>(&raw) {
                Ok(list) => {
                    self.ids = list.into_iter().collect();
                }
                Err(e) => {
                    warn!(error = %e, "Malformed favorites entry, starting empty");
                    self.ids.clear();
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Failed to load favorites, starting empty");
            }
        }
    }

    pub fn is_favorite(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Flip membership and persist the whole set. Returns the new
    /// membership state. The flip is never rolled back on persist failure.
    pub async fn toggle(&mut self, id: i64) -> bool {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
        let now_favorite = self.ids.contains(&id);

        self.persist().await;
        now_favorite
    }

    async fn persist(&self) {
        let mut list: Vec<i64> = self.ids.iter().copied().collect();
        list.sort_unstable();

        let payload = match serde_json::to_string(&list) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize favorites");
                return;
            }
        };
        if let Err(e) = self.store.set(FAVORITES_KEY, &payload).await {
            warn!(error = %e, "Failed to persist favorites, keeping in-memory state");
        }
    }
}
