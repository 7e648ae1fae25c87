//! # inventory-core: record model and versioned storage
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐    list / get / delete    ┌──────────────────┐
//! │ InventoryService │ ────────────────────────► │ RecordStore      │
//! └────────┬─────────┘                           │ (trait)          │
//!          │ update                              └────────▲─────────┘
//!          ▼                                              │
//! ┌──────────────────┐   version check + increment        │
//! │ VersionGuard     │ ───────────────────────────────────┘
//! └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`record`]: `InventoryRecord`, field identifiers and text conversion
//! - [`store`]: store contract, page/sort/filter types, in-memory store
//! - [`guard`]: optimistic version guard
//! - [`service`]: list/query façade
//! - [`error`]: conflict, validation, not-found and store errors

pub mod error;
pub mod guard;
pub mod record;
pub mod service;
pub mod store;

pub use error::{NotFoundError, SaveError, StoreError, ValidationError};
pub use guard::VersionGuard;
pub use record::{
    FieldInput, FieldValue, ImageBlob, InventoryRecord, RecordField, RecordId, Version,
    IMAGE_MAX_BYTES,
};
pub use service::InventoryService;
pub use store::{
    Direction, InMemoryRecordStore, Page, PageRequest, RecordFilter, RecordStore, SortField,
    SortOrder,
};
