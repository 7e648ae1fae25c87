//! Collaboration topic keys, derived from record identifiers.
//!
//! Unsaved records have no identifier and therefore no topic.

use std::fmt;
use std::str::FromStr;

use inventory_core::{InventoryRecord, RecordId};
use serde::{Deserialize, Serialize};

const PREFIX: &str = "record/";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Topic(String);

impl Topic {
    pub fn of(id: RecordId) -> Self {
        Topic(format!("{PREFIX}{id}"))
    }

    /// `None` for records that were never persisted.
    pub fn for_record(record: &InventoryRecord) -> Option<Self> {
        record.id.map(Topic::of)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: RecordId = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| format!("topic must start with '{PREFIX}': {s}"))?
            .parse()
            .map_err(|e| format!("invalid record id in topic '{s}': {e}"))?;
        Ok(Topic::of(id))
    }
}
