use std::sync::Arc;

use crate::store::EntryStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres in production, in-memory for `DATABASE_URL=memory://` and tests.
    pub store: Arc<dyn EntryStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self { store }
    }
}
