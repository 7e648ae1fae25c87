//! Topic → session map with bind/unbind lifecycle.
//!
//! ```text
//! bind(topic, user, seed)
//!   │  topics lock ─► get or create Session (seeded from `seed`)
//!   │  session lock ─► capacity check (refused: nothing changes)
//!   │                 newer seed ─► DraftReset
//!   │                 roster insert ─► ParticipantJoined
//!   ▼
//! Binding
//!
//! unbind(topic, user)
//!   │  topics lock ─► session lock ─► roster remove ─► ParticipantLeft
//!   │                 roster empty ─► topic dropped
//! ```
//!
//! Locks are always taken in that order (topics, then session).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use inventory_core::InventoryRecord;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::CollabConfig;
use crate::draft::SharedDraft;
use crate::error::CollabError;
use crate::protocol::UserIdentity;
use crate::session::Session;
use crate::sync::Subscription;
use crate::topic::Topic;

/// Registry counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub active_topics: usize,
    pub total_binds: u64,
    pub total_unbinds: u64,
    pub field_updates: u64,
    pub rejected_edits: u64,
}

#[derive(Default)]
pub(crate) struct AtomicRegistryStats {
    pub(crate) total_binds: AtomicU64,
    pub(crate) total_unbinds: AtomicU64,
    pub(crate) field_updates: AtomicU64,
    pub(crate) rejected_edits: AtomicU64,
}

pub struct SessionRegistry {
    config: CollabConfig,
    topics: Mutex<HashMap<Topic, Arc<Session>>>,
    pub(crate) stats: AtomicRegistryStats,
}

impl SessionRegistry {
    pub fn new(config: CollabConfig) -> Self {
        Self {
            config,
            topics: Mutex::new(HashMap::new()),
            stats: AtomicRegistryStats::default(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CollabConfig::default())
    }

    pub fn config(&self) -> &CollabConfig {
        &self.config
    }

    /// Bind `participant` to `topic`.
    ///
    /// A new topic is seeded from `seed`. An existing topic keeps its live
    /// draft unless `seed` was committed after the draft's base version.
    /// Binding the same participant twice is a no-op.
    pub async fn bind(
        &self,
        topic: &Topic,
        participant: &UserIdentity,
        seed: &InventoryRecord,
    ) -> Result<Binding, CollabError> {
        let mut topics = self.topics.lock().await;
        let (session, created) = match topics.get(topic).cloned() {
            Some(session) => (session, false),
            None => {
                let session = Arc::new(Session::new(
                    topic.clone(),
                    seed,
                    self.config.broadcast_capacity,
                    self.config.max_participants_per_topic,
                ));
                topics.insert(topic.clone(), Arc::clone(&session));
                log::info!("Opened topic {topic}");
                (session, true)
            }
        };

        match session.join(participant, seed).await {
            Ok(added) => {
                if added {
                    self.stats.total_binds.fetch_add(1, Ordering::Relaxed);
                    log::info!(
                        "{} ({}) bound to {topic}",
                        participant.name,
                        participant.user_id
                    );
                }
            }
            Err(err) => {
                if created {
                    topics.remove(topic);
                }
                log::warn!("Bind of {} to {topic} refused: {err}", participant.user_id);
                return Err(err);
            }
        }

        Ok(Binding {
            topic: topic.clone(),
            participant: participant.clone(),
            session,
        })
    }

    /// Unbind `user_id` from `topic`; the topic is dropped once empty.
    ///
    /// Returns `false` if the participant was not bound.
    pub async fn unbind(&self, topic: &Topic, user_id: &Uuid) -> bool {
        let mut topics = self.topics.lock().await;
        let Some(session) = topics.get(topic).cloned() else {
            return false;
        };
        let (removed, now_empty) = session.leave(user_id).await;
        if now_empty {
            topics.remove(topic);
            log::info!("Closed topic {topic}");
        }
        if removed {
            self.stats.total_unbinds.fetch_add(1, Ordering::Relaxed);
            log::info!("{user_id} unbound from {topic}");
        }
        removed
    }

    /// Move `participant` from `from` to `to`: leave first, then join.
    pub async fn switch(
        &self,
        from: Option<&Topic>,
        to: &Topic,
        participant: &UserIdentity,
        seed: &InventoryRecord,
    ) -> Result<Binding, CollabError> {
        if let Some(previous) = from {
            if previous != to {
                self.unbind(previous, &participant.user_id).await;
            }
        }
        self.bind(to, participant, seed).await
    }

    pub(crate) async fn session(&self, topic: &Topic) -> Result<Arc<Session>, CollabError> {
        self.topics
            .lock()
            .await
            .get(topic)
            .cloned()
            .ok_or_else(|| CollabError::UnknownTopic(topic.clone()))
    }

    /// Current participants of `topic`, in join order. Empty if the topic
    /// has no session.
    pub async fn roster_of(&self, topic: &Topic) -> Vec<UserIdentity> {
        match self.session(topic).await {
            Ok(session) => session.roster().await,
            Err(_) => Vec::new(),
        }
    }

    pub async fn draft_of(&self, topic: &Topic) -> Option<SharedDraft> {
        let session = self.session(topic).await.ok()?;
        Some(session.draft().await)
    }

    pub async fn is_bound(&self, topic: &Topic, user_id: &Uuid) -> bool {
        self.roster_of(topic).await.iter().any(|u| &u.user_id == user_id)
    }

    pub async fn topic_count(&self) -> usize {
        self.topics.lock().await.len()
    }

    pub async fn stats(&self) -> RegistryStats {
        RegistryStats {
            active_topics: self.topic_count().await,
            total_binds: self.stats.total_binds.load(Ordering::Relaxed),
            total_unbinds: self.stats.total_unbinds.load(Ordering::Relaxed),
            field_updates: self.stats.field_updates.load(Ordering::Relaxed),
            rejected_edits: self.stats.rejected_edits.load(Ordering::Relaxed),
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// A participant's membership in one topic.
#[derive(Clone)]
pub struct Binding {
    topic: Topic,
    participant: UserIdentity,
    session: Arc<Session>,
}

impl Binding {
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn participant(&self) -> &UserIdentity {
        &self.participant
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub async fn draft(&self) -> SharedDraft {
        self.session.draft().await
    }

    pub async fn roster(&self) -> Vec<UserIdentity> {
        self.session.roster().await
    }

    /// Subscribe to the topic's events (own-origin events are filtered out).
    pub async fn subscribe(&self) -> Subscription {
        Subscription::open(self.participant.user_id, Arc::clone(&self.session)).await
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("topic", &self.topic)
            .field("participant", &self.participant.user_id)
            .finish()
    }
}
