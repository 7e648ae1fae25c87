//! One live topic: its roster, its shared draft and its broadcast channel.
//!
//! Every mutation takes the session lock, mutates, and sends the resulting
//! event before releasing it, so the order seen by subscribers is the
//! order of application.

use std::sync::Arc;

use inventory_core::{FieldValue, InventoryRecord, RecordField, Version};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::draft::SharedDraft;
use crate::error::CollabError;
use crate::presence::Roster;
use crate::protocol::{SessionEvent, UserIdentity};
use crate::topic::Topic;

struct SessionState {
    roster: Roster,
    draft: SharedDraft,
}

pub struct Session {
    topic: Topic,
    state: Mutex<SessionState>,
    sender: broadcast::Sender<Arc<SessionEvent>>,
    max_participants: usize,
}

impl Session {
    pub(crate) fn new(
        topic: Topic,
        seed: &InventoryRecord,
        capacity: usize,
        max_participants: usize,
    ) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            topic,
            state: Mutex::new(SessionState {
                roster: Roster::new(),
                draft: SharedDraft::from_record(seed),
            }),
            sender,
            max_participants,
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    fn publish(&self, event: SessionEvent) -> usize {
        // No receivers is not an error, the event still happened
        self.sender.send(Arc::new(event)).unwrap_or(0)
    }

    /// Add `participant`, rebasing the draft onto `seed` if it carries a
    /// strictly newer committed version. Returns `false` if already present.
    ///
    /// A refused join leaves the draft untouched.
    pub(crate) async fn join(
        &self,
        participant: &UserIdentity,
        seed: &InventoryRecord,
    ) -> Result<bool, CollabError> {
        let mut state = self.state.lock().await;
        let present = state.roster.contains(&participant.user_id);
        if !present && state.roster.len() >= self.max_participants {
            return Err(CollabError::TopicFull {
                topic: self.topic.clone(),
                limit: self.max_participants,
            });
        }
        self.rebase_locked(&mut state, seed);
        if present {
            return Ok(false);
        }
        state.roster.insert(participant.clone());
        self.publish(SessionEvent::ParticipantJoined(participant.clone()));
        Ok(true)
    }

    /// Remove `user_id`. Returns `(removed, now_empty)`.
    pub(crate) async fn leave(&self, user_id: &Uuid) -> (bool, bool) {
        let mut state = self.state.lock().await;
        let removed = state.roster.remove(user_id).is_some();
        if removed {
            self.publish(SessionEvent::ParticipantLeft(*user_id));
        }
        (removed, state.roster.is_empty())
    }

    /// Write one field of the shared draft on behalf of `origin`.
    ///
    /// Returns the sequence number assigned to the write.
    pub(crate) async fn apply_field(
        &self,
        origin: Uuid,
        field: RecordField,
        value: FieldValue,
    ) -> Result<u64, CollabError> {
        let mut state = self.state.lock().await;
        if !state.roster.contains(&origin) {
            return Err(CollabError::NotBound {
                topic: self.topic.clone(),
                user_id: origin,
            });
        }
        let seq = state.draft.apply(field, value.clone())?;
        self.publish(SessionEvent::FieldChanged {
            field,
            value,
            origin,
            seq,
        });
        Ok(seq)
    }

    fn rebase_locked(&self, state: &mut SessionState, seed: &InventoryRecord) -> bool {
        let newer = match (seed.version, state.draft.base_version()) {
            (Some(seeded), Some(base)) => seeded > base,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !newer {
            return false;
        }
        state.draft.rebase(seed);
        log::info!(
            "Rebased draft of {} onto committed {:?}",
            self.topic,
            seed.version
        );
        self.publish(SessionEvent::DraftReset {
            draft: state.draft.clone(),
        });
        true
    }

    /// Record a successful commit by `by`.
    pub(crate) async fn mark_saved(&self, by: Uuid, version: Version) -> bool {
        let mut state = self.state.lock().await;
        if !state.draft.advance_version(version) {
            return false;
        }
        self.publish(SessionEvent::Saved { version, by });
        true
    }

    pub async fn draft(&self) -> SharedDraft {
        self.state.lock().await.draft.clone()
    }

    pub async fn roster(&self) -> Vec<UserIdentity> {
        self.state.lock().await.roster.to_vec()
    }

    pub async fn participant_count(&self) -> usize {
        self.state.lock().await.roster.len()
    }

    /// Snapshot and receiver taken atomically: no event is missed or
    /// delivered twice relative to the snapshot.
    pub(crate) async fn snapshot_and_subscribe(
        &self,
    ) -> (SharedDraft, Vec<UserIdentity>, broadcast::Receiver<Arc<SessionEvent>>) {
        let state = self.state.lock().await;
        let receiver = self.sender.subscribe();
        (state.draft.clone(), state.roster.to_vec(), receiver)
    }

    /// Draft and roster read under one lock acquisition.
    pub(crate) async fn snapshot(&self) -> (SharedDraft, Vec<UserIdentity>) {
        let state = self.state.lock().await;
        (state.draft.clone(), state.roster.to_vec())
    }
}
