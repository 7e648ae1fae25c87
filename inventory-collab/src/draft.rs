//! The shared, not-yet-persisted field values of one topic.
//!
//! Seeded from the last committed record when the topic is created, then
//! changed only by field edits (last writer wins per field) until a save
//! advances its base version.

use std::collections::BTreeMap;

use inventory_core::{
    FieldValue, ImageBlob, InventoryRecord, RecordField, RecordId, ValidationError, Version,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDraft {
    fields: InventoryRecord,
    /// Last applied sequence number in this topic
    seq: u64,
    /// Sequence number of the last write per field
    field_seq: BTreeMap<RecordField, u64>,
}

impl SharedDraft {
    pub fn from_record(record: &InventoryRecord) -> Self {
        Self {
            fields: record.clone(),
            seq: 0,
            field_seq: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> Option<RecordId> {
        self.fields.id
    }

    /// Committed version the live edits build on.
    pub fn base_version(&self) -> Option<Version> {
        self.fields.version
    }

    pub fn field(&self, field: RecordField) -> FieldValue {
        self.fields.field(field)
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.name.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.fields.category.as_deref()
    }

    pub fn counter(&self) -> Option<i32> {
        self.fields.counter
    }

    pub fn image(&self) -> Option<&ImageBlob> {
        self.fields.image.as_ref()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Sequence number of the write currently held by `field`, if edited.
    pub fn last_write(&self, field: RecordField) -> Option<u64> {
        self.field_seq.get(&field).copied()
    }

    /// Overwrite `field` and return the sequence number assigned to the write.
    ///
    /// A value of the wrong kind is rejected and the draft is left untouched.
    pub fn apply(&mut self, field: RecordField, value: FieldValue) -> Result<u64, ValidationError> {
        self.fields.set_field(field, value)?;
        self.seq += 1;
        self.field_seq.insert(field, self.seq);
        Ok(self.seq)
    }

    /// Replace the draft with a newer commit, keeping the sequence monotonic.
    pub fn rebase(&mut self, record: &InventoryRecord) {
        self.fields = record.clone();
        self.field_seq.clear();
    }

    pub(crate) fn advance_version(&mut self, version: Version) -> bool {
        if self.fields.version.map_or(true, |current| version > current) {
            self.fields.version = Some(version);
            return true;
        }
        false
    }

    /// Copy the shared field values onto `target`.
    ///
    /// `id` and `version` are never touched, so a save still carries the
    /// version `target` was read with. The image is copied only when it
    /// was staged on the draft itself.
    pub fn write_into(&self, target: &mut InventoryRecord) {
        target.name = self.fields.name.clone();
        target.category = self.fields.category.clone();
        target.counter = self.fields.counter;
        if self.field_seq.contains_key(&RecordField::Image) {
            target.image = self.fields.image.clone();
        }
    }

    pub fn to_record(&self) -> InventoryRecord {
        self.fields.clone()
    }
}
