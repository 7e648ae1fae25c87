//! Presence: who is currently bound to a topic.
//!
//! ## Data flow
//!
//! ```text
//!  SessionRegistry::bind / unbind
//!        │  (roster mutated under the session lock)
//!        ▼
//!  SessionEvent::ParticipantJoined / ParticipantLeft
//!        │  (topic broadcast)
//!        ▼
//!  PresenceView::apply()  ──►  Some(Visibility) on empty ↔ non-empty
//!        │
//!        ▼
//!  avatar group ("2 people editing")
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::{SessionEvent, UserIdentity};

/// Ordered, duplicate-free participant list (join order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    members: Vec<UserIdentity>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `user` unless already present. Returns `true` if added.
    pub fn insert(&mut self, user: UserIdentity) -> bool {
        if self.contains(&user.user_id) {
            return false;
        }
        self.members.push(user);
        true
    }

    pub fn remove(&mut self, user_id: &Uuid) -> Option<UserIdentity> {
        let index = self.members.iter().position(|m| &m.user_id == user_id)?;
        Some(self.members.remove(index))
    }

    pub fn contains(&self, user_id: &Uuid) -> bool {
        self.members.iter().any(|m| &m.user_id == user_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserIdentity> {
        self.members.iter()
    }

    pub fn to_vec(&self) -> Vec<UserIdentity> {
        self.members.clone()
    }
}

impl From<Vec<UserIdentity>> for Roster {
    fn from(users: Vec<UserIdentity>) -> Self {
        let mut roster = Roster::new();
        for user in users {
            roster.insert(user);
        }
        roster
    }
}

/// One entry of the avatar group.
#[derive(Debug, Clone, PartialEq)]
pub struct Avatar {
    pub user_id: Uuid,
    pub initials: String,
    pub color: [f32; 4],
}

impl From<&UserIdentity> for Avatar {
    fn from(user: &UserIdentity) -> Self {
        Self {
            user_id: user.user_id,
            initials: user.initials(),
            color: user.color,
        }
    }
}

/// Visibility transition of the avatar group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Shown,
    Hidden,
}

/// Client-side presence model for one editor.
///
/// Hidden while the roster is empty, visible otherwise. Every mutation
/// reports a [`Visibility`] only when it flips.
#[derive(Debug, Clone, Default)]
pub struct PresenceView {
    roster: Roster,
    visible: bool,
}

impl PresenceView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster with a fresh snapshot (after a bind).
    pub fn reset(&mut self, members: Vec<UserIdentity>) -> Option<Visibility> {
        self.roster = Roster::from(members);
        self.refresh()
    }

    /// Forget everyone (the editor left its topic).
    pub fn clear(&mut self) -> Option<Visibility> {
        self.roster = Roster::new();
        self.refresh()
    }

    /// Fold a topic event into the roster. Non-presence events are ignored.
    pub fn apply(&mut self, event: &SessionEvent) -> Option<Visibility> {
        match event {
            SessionEvent::ParticipantJoined(user) => {
                self.roster.insert(user.clone());
            }
            SessionEvent::ParticipantLeft(user_id) => {
                self.roster.remove(user_id);
            }
            _ => return None,
        }
        self.refresh()
    }

    fn refresh(&mut self) -> Option<Visibility> {
        let visible = !self.roster.is_empty();
        if visible == self.visible {
            return None;
        }
        self.visible = visible;
        Some(if visible { Visibility::Shown } else { Visibility::Hidden })
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Avatars in join order.
    pub fn avatars(&self) -> Vec<Avatar> {
        self.roster.iter().map(Avatar::from).collect()
    }

    pub fn label(&self) -> String {
        match self.roster.len() {
            1 => "1 person editing".to_string(),
            n => format!("{n} people editing"),
        }
    }
}
