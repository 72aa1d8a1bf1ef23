use crate::store::{Store, StoreResult, Table};
use std::sync::Arc;
use tracing::debug;

/// Identifier-level duplicate check against already stored rows.
///
/// Only the identifier is compared. An edited remote listing under the same
/// identifier is skipped, never updated.
#[derive(Clone)]
pub struct Deduplicator {
    store: Arc<dyn Store>,
}

impl Deduplicator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn is_duplicate(&self, table: Table, column: &str, id: &str) -> StoreResult<bool> {
        let found = self.store.exists(table, column, id).await?;
        if found {
            debug!(table = table.name(), column, id, "already stored");
        }
        Ok(found)
    }
}
