//! Optimistic version guard around record saves.
//!
//! A save carries the version the record was read with. The store compares
//! it with the stored version and increments on match; a mismatch comes
//! back as [`SaveError::Conflict`]. Nothing is retried here: the caller
//! reloads and re-applies.

use std::sync::Arc;

use crate::error::{NotFoundError, SaveError};
use crate::record::{InventoryRecord, RecordId};
use crate::store::RecordStore;

pub struct VersionGuard<S: RecordStore + ?Sized> {
    store: Arc<S>,
}

impl<S: RecordStore + ?Sized> Clone for VersionGuard<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl<S: RecordStore + ?Sized> VersionGuard<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist `record` if nobody else wrote it since it was read.
    pub fn save(&self, record: &InventoryRecord) -> Result<InventoryRecord, SaveError> {
        match self.store.save(record) {
            Ok(saved) => {
                log::info!(
                    "Saved record {} at {}",
                    saved.id.map_or_else(|| "?".to_string(), |id| id.to_string()),
                    saved.version.map_or_else(|| "?".to_string(), |v| v.to_string()),
                );
                Ok(saved)
            }
            Err(e @ SaveError::Conflict { .. }) => {
                log::warn!("Rejected stale save: {e}");
                Err(e)
            }
            Err(e) => {
                log::warn!("Save failed: {e}");
                Err(e)
            }
        }
    }

    /// Fetch the current committed state, for the reload-and-re-apply path.
    pub fn reload(&self, id: RecordId) -> Result<InventoryRecord, SaveError> {
        self.store.get(id)?.ok_or(SaveError::NotFound(NotFoundError(id)))
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
