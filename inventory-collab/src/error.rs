use inventory_core::ValidationError;
use thiserror::Error;
use uuid::Uuid;

use crate::topic::Topic;

/// Errors raised by the session registry and the field engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollabError {
    #[error("Participant {user_id} is not bound to {topic}")]
    NotBound { topic: Topic, user_id: Uuid },

    #[error("Topic {topic} is full ({limit} participants)")]
    TopicFull { topic: Topic, limit: usize },

    #[error("No active session for {0}")]
    UnknownTopic(Topic),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
