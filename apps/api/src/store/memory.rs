use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use trail_core::{NewQuery, QueryEntry, QueryStatus, QueryUpdate};

use super::{EntryStore, StoreError};

/// In-process entry store. Contents are lost on restart.
///
/// Ids start at 1 and only ever increase.
#[derive(Default)]
pub struct MemoryEntryStore {
    entries: RwLock<BTreeMap<i64, QueryEntry>>,
    last_id: AtomicI64,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn create(&self, query: &NewQuery) -> Result<i64, StoreError> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = QueryEntry {
            id,
            latitude: query.coordinates.latitude,
            longitude: query.coordinates.longitude,
            user_question: query.user_question.clone(),
            context_tag: query.context_tag.clone(),
            status: QueryStatus::Ready,
            llm_response: None,
            created_at: Utc::now(),
        };
        self.entries.write().await.insert(id, entry);
        Ok(id)
    }

    async fn read(&self, id: i64) -> Result<Option<QueryEntry>, StoreError> {
        Ok(self.entries.read().await.get(&id).cloned())
    }

    async fn update(&self, update: &QueryUpdate) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&update.id) {
            Some(entry) => {
                entry.llm_response = Some(update.llm_response.clone());
                entry.status = update.status;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
