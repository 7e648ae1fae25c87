//! In-memory record store.
//!
//! Rows live in a `BTreeMap` behind a single `RwLock`. The version check and
//! the increment of a save happen under the write lock, which makes saves
//! of the same record linearizable.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::{NotFoundError, SaveError, StoreError};
use crate::record::{InventoryRecord, RecordId, Version, IMAGE_MAX_BYTES};
use crate::store::{Page, PageRequest, RecordStore};

pub struct InMemoryRecordStore {
    rows: RwLock<BTreeMap<RecordId, InventoryRecord>>,
    /// Next id to assign on insert
    next_id: AtomicU64,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store pre-populated with persisted rows (ids and versions kept as given).
    ///
    /// Rows without an id are assigned one; rows without a version start at
    /// [`Version::INITIAL`].
    pub fn with_records(records: impl IntoIterator<Item = InventoryRecord>) -> Self {
        let store = Self::new();
        {
            let mut rows = match store.rows.write() {
                Ok(rows) => rows,
                Err(poisoned) => poisoned.into_inner(),
            };
            for mut record in records {
                let id = match record.id {
                    Some(id) => id,
                    None => RecordId(store.next_id.load(Ordering::SeqCst)),
                };
                store.next_id.fetch_max(id.0.saturating_add(1), Ordering::SeqCst);
                record.id = Some(id);
                record.version.get_or_insert(Version::INITIAL);
                rows.insert(id, record);
            }
        }
        store
    }

    fn check_image(record: &InventoryRecord) -> Result<(), SaveError> {
        let size = record.image_len();
        if size > IMAGE_MAX_BYTES {
            return Err(SaveError::ImageTooLarge { size, limit: IMAGE_MAX_BYTES });
        }
        Ok(())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, id: RecordId) -> Result<Option<InventoryRecord>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(&id).cloned())
    }

    fn save(&self, record: &InventoryRecord) -> Result<InventoryRecord, SaveError> {
        Self::check_image(record)?;

        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;

        let Some(id) = record.id else {
            // The write lock serializes id assignment
            let id = RecordId(self.next_id.load(Ordering::SeqCst));
            if rows.contains_key(&id) {
                return Err(StoreError::IdsExhausted.into());
            }
            self.next_id.store(id.0.saturating_add(1), Ordering::SeqCst);
            let mut stored = record.clone();
            stored.id = Some(id);
            stored.version = Some(Version::INITIAL);
            rows.insert(id, stored.clone());
            log::debug!("Inserted record {id}");
            return Ok(stored);
        };

        let current = rows.get(&id).ok_or(NotFoundError(id))?;
        let actual = current.version.unwrap_or(Version::INITIAL);
        if record.version != Some(actual) {
            return Err(SaveError::Conflict {
                id,
                expected: record.version,
                actual,
            });
        }

        let mut stored = record.clone();
        stored.version = Some(actual.next());
        rows.insert(id, stored.clone());
        log::debug!("Updated record {id} to {}", actual.next());
        Ok(stored)
    }

    fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        rows.remove(&id).map(|_| ()).ok_or(StoreError::NotFound(id))
    }

    fn query(&self, request: &PageRequest) -> Result<Page<InventoryRecord>, StoreError> {
        request.validate()?;
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;

        let mut matching: Vec<InventoryRecord> = rows
            .values()
            .filter(|r| request.filter.matches(r))
            .cloned()
            .collect();
        drop(rows);

        request.sort_records(&mut matching);
        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(request.offset())
            .take(request.page_size)
            .collect();

        Ok(Page {
            items,
            page: request.page,
            page_size: request.page_size,
            total,
        })
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.rows.read().map_err(|_| StoreError::Poisoned)?.len())
    }
}
