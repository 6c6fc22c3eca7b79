//! Entry Store: persistence for query entries.
//!
//! Every operation is a single statement; there are no multi-row
//! transactions. Deleting entries is not supported.

use async_trait::async_trait;
use thiserror::Error;
use trail_core::{NewQuery, QueryEntry, QueryUpdate};

pub mod memory;
pub mod postgres;

pub use memory::MemoryEntryStore;
pub use postgres::PgEntryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Inserts a new entry with status `ready` and returns its id.
    async fn create(&self, query: &NewQuery) -> Result<i64, StoreError>;

    async fn read(&self, id: i64) -> Result<Option<QueryEntry>, StoreError>;

    /// Overwrites `llm_response` and `status`. Returns the number of rows matched.
    async fn update(&self, update: &QueryUpdate) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
