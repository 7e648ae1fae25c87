//! List/query façade consumed by the grid and the editor.
//!
//! Pure delegation to the [`RecordStore`]; updates go through the
//! [`VersionGuard`].

use std::sync::Arc;

use crate::error::{SaveError, StoreError};
use crate::guard::VersionGuard;
use crate::record::{InventoryRecord, RecordId};
use crate::store::{Page, PageRequest, RecordFilter, RecordStore, SortOrder};

pub struct InventoryService<S: RecordStore + ?Sized> {
    store: Arc<S>,
    guard: VersionGuard<S>,
}

impl<S: RecordStore + ?Sized> Clone for InventoryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<S: RecordStore + ?Sized> InventoryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        let guard = VersionGuard::new(store.clone());
        Self { store, guard }
    }

    pub fn get(&self, id: RecordId) -> Result<Option<InventoryRecord>, StoreError> {
        self.store.get(id)
    }

    pub fn update(&self, record: &InventoryRecord) -> Result<InventoryRecord, SaveError> {
        self.guard.save(record)
    }

    pub fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        self.store.delete(id)?;
        log::info!("Deleted record {id}");
        Ok(())
    }

    pub fn list(
        &self,
        page: usize,
        page_size: usize,
        sort: &[SortOrder],
        filter: &RecordFilter,
    ) -> Result<Page<InventoryRecord>, StoreError> {
        let request = PageRequest {
            page,
            page_size,
            sort: sort.to_vec(),
            filter: filter.clone(),
        };
        self.store.query(&request)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        self.store.count()
    }

    pub fn guard(&self) -> &VersionGuard<S> {
        &self.guard
    }
}
