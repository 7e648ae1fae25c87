//! Error taxonomy shared by the store, the guard and the collaboration layer.
//!
//! Each kind is recovered at the boundary closest to where it originates.
//! The editor in `inventory-collab` turns them into user notifications.

use thiserror::Error;

use crate::record::{RecordField, RecordId, Version};

/// A field value could not be converted or does not fit the field.
///
/// Local to one field: the shared draft keeps its previous value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for '{field}': {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn for_field(field: RecordField, message: impl Into<String>) -> Self {
        Self::new(field.as_str(), message)
    }
}

/// The record has no backing row (never existed, or deleted by someone else).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Record not found: {0}")]
pub struct NotFoundError(pub RecordId);

/// Failures of the store itself, unrelated to the record content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Invalid page request: {0}")]
    InvalidPage(String),

    #[error("Record id sequence exhausted")]
    IdsExhausted,
}

impl From<NotFoundError> for StoreError {
    fn from(e: NotFoundError) -> Self {
        StoreError::NotFound(e.0)
    }
}

/// Outcome of a rejected save.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// The stored version moved on since the record was read.
    #[error("Version conflict on record {id}: expected {expected:?}, stored {actual}")]
    Conflict {
        id: RecordId,
        expected: Option<Version>,
        actual: Version,
    },

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("Image too large: {size} bytes (limit {limit})")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl SaveError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, SaveError::Conflict { .. })
    }
}
