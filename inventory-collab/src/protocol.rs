//! Participant identity and the events fanned out on a topic.
//!
//! Events travel over the in-process broadcast channel as
//! `Arc<SessionEvent>`. The real-time transport that carries them to
//! browsers is external; it gets raw bytes from [`SessionEvent::encode`].
//!
//! Wire format (bincode, standard config):
//! ```text
//! ┌─────────┬─────────────────────────────────────────┐
//! │ variant │ fields (field, value, origin, seq, …)   │
//! │ varint  │ variable                                │
//! └─────────┴─────────────────────────────────────────┘
//! ```

use inventory_core::{FieldValue, RecordField, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::draft::SharedDraft;

/// User identity supplied by the hosting environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserIdentity {
    pub user_id: Uuid,
    pub name: String,
    /// RGBA color for the avatar
    pub color: [f32; 4],
}

impl UserIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Create with explicit user_id (identity provider or tests)
    pub fn with_id(user_id: Uuid, name: impl Into<String>) -> Self {
        // Stable color from user_id hash
        let hash = user_id.as_u128();
        let r = (hash & 0xFF) as f32 / 255.0;
        let g = ((hash >> 8) & 0xFF) as f32 / 255.0;
        let b = ((hash >> 16) & 0xFF) as f32 / 255.0;
        Self {
            user_id,
            name: name.into(),
            color: [r, g, b, 1.0],
        }
    }

    /// Avatar abbreviation: first letter of up to two words.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// Event broadcast to every subscriber of a topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SessionEvent {
    /// A field of the shared draft was written.
    FieldChanged {
        field: RecordField,
        value: FieldValue,
        origin: Uuid,
        /// Application order within the topic
        seq: u64,
    },
    ParticipantJoined(UserIdentity),
    ParticipantLeft(Uuid),
    /// The record was committed; the draft now builds on `version`.
    Saved { version: Version, by: Uuid },
    /// Full draft replacement (rebase onto a newer commit, or lag recovery).
    DraftReset { draft: SharedDraft },
}

impl SessionEvent {
    /// Participant that caused the event, if any.
    pub fn origin(&self) -> Option<Uuid> {
        match self {
            SessionEvent::FieldChanged { origin, .. } => Some(*origin),
            SessionEvent::ParticipantJoined(user) => Some(user.user_id),
            SessionEvent::ParticipantLeft(user_id) => Some(*user_id),
            SessionEvent::Saved { by, .. } => Some(*by),
            SessionEvent::DraftReset { .. } => None,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (event, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
        Ok(event)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}
