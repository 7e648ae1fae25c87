//! Inventory record model and field-level value conversion.
//!
//! A record is created transiently when a user starts a "new record" edit,
//! receives its `id` and first `version` from the store on the first save,
//! and is never mutated outside a save afterwards.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Storage ceiling for the image column, in bytes.
pub const IMAGE_MAX_BYTES: usize = 1_000_000;

/// Stable surrogate identifier, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(RecordId)
    }
}

/// Optimistic concurrency version, incremented by the store on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(pub u64);

impl Version {
    pub const INITIAL: Version = Version(0);

    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Editable fields of an [`InventoryRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordField {
    Name,
    Category,
    Counter,
    Image,
}

impl RecordField {
    pub const ALL: [RecordField; 4] = [
        RecordField::Name,
        RecordField::Category,
        RecordField::Counter,
        RecordField::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordField::Name => "name",
            RecordField::Category => "category",
            RecordField::Counter => "counter",
            RecordField::Image => "image",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ValidationError::new(s, "Unknown field"))
    }
}

/// Immutable image payload, shared between drafts, records and previews.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlob(Arc<[u8]>);

impl ImageBlob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `data:` URL used by the grid column and the form preview.
    pub fn data_url(&self) -> String {
        format!(
            "data:image;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.0)
        )
    }
}

impl fmt::Debug for ImageBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageBlob({} bytes)", self.0.len())
    }
}

/// A typed value for one [`RecordField`]. `None` clears the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(Option<String>),
    Number(Option<i32>),
    Image(Option<ImageBlob>),
}

impl FieldValue {
    /// Whether this value kind may be stored in `field`.
    pub fn fits(&self, field: RecordField) -> bool {
        matches!(
            (field, self),
            (RecordField::Name | RecordField::Category, FieldValue::Text(_))
                | (RecordField::Counter, FieldValue::Number(_))
                | (RecordField::Image, FieldValue::Image(_))
        )
    }
}

/// Converts raw form input into typed field values.
pub struct FieldInput;

impl FieldInput {
    /// Parse `raw` text as typed into the form for `field`.
    ///
    /// Empty input clears the field. The counter accepts a trimmed `i32`
    /// and rejects anything else; images cannot be entered as text.
    pub fn parse(field: RecordField, raw: &str) -> Result<FieldValue, ValidationError> {
        match field {
            RecordField::Name | RecordField::Category => {
                if raw.is_empty() {
                    Ok(FieldValue::Text(None))
                } else {
                    Ok(FieldValue::Text(Some(raw.to_string())))
                }
            }
            RecordField::Counter => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(FieldValue::Number(None));
                }
                trimmed
                    .parse::<i32>()
                    .map(|n| FieldValue::Number(Some(n)))
                    .map_err(|_| ValidationError::for_field(field, "Only numbers are allowed"))
            }
            RecordField::Image => Err(ValidationError::for_field(
                field,
                "Images are staged through an upload",
            )),
        }
    }
}

/// Persisted inventory entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// `None` until first persisted.
    pub id: Option<RecordId>,
    /// Version the record was read with; `None` for a new record.
    pub version: Option<Version>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub counter: Option<i32>,
    pub image: Option<ImageBlob>,
}

impl InventoryRecord {
    /// Blank transient record, as created by "new record".
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn field(&self, field: RecordField) -> FieldValue {
        match field {
            RecordField::Name => FieldValue::Text(self.name.clone()),
            RecordField::Category => FieldValue::Text(self.category.clone()),
            RecordField::Counter => FieldValue::Number(self.counter),
            RecordField::Image => FieldValue::Image(self.image.clone()),
        }
    }

    pub fn set_field(&mut self, field: RecordField, value: FieldValue) -> Result<(), ValidationError> {
        match (field, value) {
            (RecordField::Name, FieldValue::Text(v)) => self.name = v,
            (RecordField::Category, FieldValue::Text(v)) => self.category = v,
            (RecordField::Counter, FieldValue::Number(v)) => self.counter = v,
            (RecordField::Image, FieldValue::Image(v)) => self.image = v,
            (field, _) => {
                return Err(ValidationError::for_field(field, "Value has the wrong type"));
            }
        }
        Ok(())
    }

    /// Size of the staged image, if any.
    pub fn image_len(&self) -> usize {
        self.image.as_ref().map_or(0, ImageBlob::len)
    }
}
