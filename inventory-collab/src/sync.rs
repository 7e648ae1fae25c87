//! Field synchronization: per-field writes into a topic's shared draft and
//! the subscriptions that observe them.

use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures_util::stream::{self, Stream};
use inventory_core::{FieldInput, FieldValue, RecordField};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::draft::SharedDraft;
use crate::error::CollabError;
use crate::protocol::{SessionEvent, UserIdentity};
use crate::registry::SessionRegistry;
use crate::session::Session;
use crate::topic::Topic;

impl SessionRegistry {
    /// Write `value` into `field` of the topic's shared draft and broadcast it
    /// to the other participants. Returns the assigned sequence number.
    pub async fn set_field(
        &self,
        topic: &Topic,
        origin: Uuid,
        field: RecordField,
        value: FieldValue,
    ) -> Result<u64, CollabError> {
        let result = match self.session(topic).await {
            Ok(session) => session.apply_field(origin, field, value).await,
            Err(err) => Err(err),
        };
        match &result {
            Ok(seq) => {
                self.stats.field_updates.fetch_add(1, Ordering::Relaxed);
                log::debug!("{topic}: {origin} set {field} (seq {seq})");
            }
            Err(err) => {
                self.stats.rejected_edits.fetch_add(1, Ordering::Relaxed);
                log::warn!("{topic}: edit of {field} by {origin} rejected: {err}");
            }
        }
        result
    }

    /// Parse raw form text for `field` and write it. A parse failure leaves
    /// the draft untouched.
    pub async fn set_field_text(
        &self,
        topic: &Topic,
        origin: Uuid,
        field: RecordField,
        raw: &str,
    ) -> Result<u64, CollabError> {
        let value = match FieldInput::parse(field, raw) {
            Ok(value) => value,
            Err(err) => {
                self.stats.rejected_edits.fetch_add(1, Ordering::Relaxed);
                log::warn!("{topic}: invalid input for {field} from {origin}: {err}");
                return Err(err.into());
            }
        };
        self.set_field(topic, origin, field, value).await
    }

    /// Subscribe a bound participant to `topic`.
    pub async fn subscribe(&self, topic: &Topic, user_id: Uuid) -> Result<Subscription, CollabError> {
        let session = self.session(topic).await?;
        let subscription = Subscription::open(user_id, session).await;
        if !subscription.roster().iter().any(|u| u.user_id == user_id) {
            return Err(CollabError::NotBound {
                topic: topic.clone(),
                user_id,
            });
        }
        Ok(subscription)
    }
}

/// Receiving end of a topic for one participant.
///
/// Events caused by the participant itself are skipped. The subscription
/// ends once the participant's own `ParticipantLeft` arrives.
pub struct Subscription {
    participant: Uuid,
    session: Arc<Session>,
    receiver: broadcast::Receiver<Arc<SessionEvent>>,
    draft: SharedDraft,
    roster: Vec<UserIdentity>,
    /// Field writes at or below this sequence are already in `draft`
    synced_seq: u64,
    closed: bool,
}

impl Subscription {
    pub(crate) async fn open(participant: Uuid, session: Arc<Session>) -> Self {
        let (draft, roster, receiver) = session.snapshot_and_subscribe().await;
        Self {
            participant,
            synced_seq: draft.seq(),
            session,
            receiver,
            draft,
            roster,
            closed: false,
        }
    }

    /// Draft as of subscription time (or the last lag recovery).
    pub fn draft(&self) -> &SharedDraft {
        &self.draft
    }

    /// Roster as of subscription time (or the last lag recovery).
    pub fn roster(&self) -> &[UserIdentity] {
        &self.roster
    }

    pub fn topic(&self) -> &Topic {
        self.session.topic()
    }

    /// Next event from another participant, or `None` once closed.
    pub async fn recv(&mut self) -> Option<Arc<SessionEvent>> {
        if self.closed {
            return None;
        }
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    match &*event {
                        SessionEvent::ParticipantLeft(user_id) if *user_id == self.participant => {
                            self.closed = true;
                            return None;
                        }
                        SessionEvent::FieldChanged { seq, .. } if *seq <= self.synced_seq => continue,
                        SessionEvent::DraftReset { draft } => self.synced_seq = draft.seq(),
                        _ => {}
                    }
                    if event.origin() == Some(self.participant) {
                        continue;
                    }
                    return Some(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!(
                        "Subscriber {} on {} lagged by {skipped} events, resyncing",
                        self.participant,
                        self.session.topic()
                    );
                    let (draft, roster) = self.session.snapshot().await;
                    self.synced_seq = draft.seq();
                    self.draft = draft.clone();
                    self.roster = roster;
                    return Some(Arc::new(SessionEvent::DraftReset { draft }));
                }
                Err(RecvError::Closed) => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    /// Adapt into a `Stream` of events.
    pub fn into_stream(self) -> Pin<Box<dyn Stream<Item = Arc<SessionEvent>> + Send>> {
        Box::pin(stream::unfold(self, |mut subscription| async move {
            let event = subscription.recv().await?;
            Some((event, subscription))
        }))
    }
}
