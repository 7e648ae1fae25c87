//! Record store contract and an in-memory implementation.
//!
//! Architecture:
//! ```text
//! ┌──────────────────┐   get / save / delete   ┌──────────────────┐
//! │ InventoryService │ ──────────────────────► │ dyn RecordStore  │
//! │ (list façade)    │   query / count         │                  │
//! └────────┬─────────┘                         └────────┬─────────┘
//!          │ save                                       │
//!          ▼                                            ▼
//! ┌──────────────────┐  compare-and-increment  ┌──────────────────┐
//! │ VersionGuard     │ ──────────────────────► │ InMemoryRecord-  │
//! │                  │     (under one lock)    │ Store (BTreeMap) │
//! └──────────────────┘                         └──────────────────┘
//! ```
//!
//! Persistence plumbing is an external collaborator; the in-memory store
//! implements the same contract for tests, the demo and embedding hosts.

pub mod memory;
pub mod query;

pub use memory::InMemoryRecordStore;
pub use query::{Direction, Page, PageRequest, RecordFilter, SortField, SortOrder};

use crate::error::{SaveError, StoreError};
use crate::record::{InventoryRecord, RecordId};

/// CRUD and paginated query over inventory records.
///
/// `save` must verify and increment the version atomically: two saves of
/// the same record read at the same version cannot both succeed.
pub trait RecordStore: Send + Sync {
    fn get(&self, id: RecordId) -> Result<Option<InventoryRecord>, StoreError>;

    /// Insert (no id) or version-checked update (id + read version).
    ///
    /// Returns the stored record carrying its new version.
    fn save(&self, record: &InventoryRecord) -> Result<InventoryRecord, SaveError>;

    fn delete(&self, id: RecordId) -> Result<(), StoreError>;

    fn query(&self, request: &PageRequest) -> Result<Page<InventoryRecord>, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;
}
