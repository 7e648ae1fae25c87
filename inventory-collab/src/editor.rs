//! Per-user record editor: the command handlers behind the list/detail
//! form.
//!
//! ```text
//!  open(id) ──► service.get ──► populate ──► registry.switch(topic)
//!  edit(field, raw) ──► registry.set_field_text      (bound)
//!                   └─► local record                 (no topic)
//!  upload(stream) ──► UploadIntake ──► stage on local record
//!  save() ──► draft.write_into(record) ──► VersionGuard ──► Saved
//! ```
//!
//! Failures never escape as errors: every outcome the user should see is
//! turned into a [`Notification`].

use std::io;
use std::sync::Arc;

use futures_util::Stream;
use inventory_core::{
    FieldInput, InventoryRecord, InventoryService, RecordField, RecordId, RecordStore, SaveError,
};

use crate::draft::SharedDraft;
use crate::error::CollabError;
use crate::presence::{PresenceView, Visibility};
use crate::protocol::{SessionEvent, UserIdentity};
use crate::registry::{Binding, SessionRegistry};
use crate::sync::Subscription;
use crate::topic::Topic;
use crate::upload::{stage, UploadIntake};

pub const MSG_SAVED: &str = "Data updated";
pub const MSG_CONFLICT: &str =
    "Error updating the data. Somebody else has updated the record while you were making changes.";
pub const MSG_INVALID: &str = "Failed to update the data. Check again that all values are valid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn not_found(id: RecordId) -> Self {
        Self::error(format!("The requested record was not found, ID = {id}"))
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// A topic event as seen by the editor, with the avatar-group transition
/// it caused.
#[derive(Debug, Clone)]
pub struct EditorUpdate {
    pub event: Arc<SessionEvent>,
    pub visibility: Option<Visibility>,
}

pub struct RecordEditor<S: RecordStore + ?Sized> {
    identity: UserIdentity,
    registry: Arc<SessionRegistry>,
    service: InventoryService<S>,
    intake: UploadIntake,
    record: Option<InventoryRecord>,
    binding: Option<Binding>,
    subscription: Option<Subscription>,
    presence: PresenceView,
}

impl<S: RecordStore + ?Sized> RecordEditor<S> {
    pub fn new(
        identity: UserIdentity,
        registry: Arc<SessionRegistry>,
        service: InventoryService<S>,
    ) -> Self {
        let intake = UploadIntake::new(registry.config());
        Self {
            identity,
            registry,
            service,
            intake,
            record: None,
            binding: None,
            subscription: None,
            presence: PresenceView::new(),
        }
    }

    /// Load record `id` into the form and join its topic.
    ///
    /// Returns a notification when the form could not be populated.
    pub async fn open(&mut self, id: RecordId) -> Option<Notification> {
        let loaded = match self.service.get(id) {
            Ok(loaded) => loaded,
            Err(err) => {
                log::warn!("Loading record {id} failed: {err}");
                self.clear().await;
                return Some(Notification::error(err.to_string()));
            }
        };
        let Some(record) = loaded else {
            log::warn!("Record {id} not found, falling back to the list");
            self.clear().await;
            return Some(Notification::not_found(id));
        };
        match self.populate(Some(record)).await {
            Ok(_) => None,
            Err(err) => Some(Notification::error(err.to_string())),
        }
    }

    /// Re-read the committed state of the current record, keeping the
    /// topic's live edits.
    pub async fn reload(&mut self) -> Option<Notification> {
        let id = self.record.as_ref().and_then(|r| r.id)?;
        match self.service.guard().reload(id) {
            Ok(record) => match self.populate(Some(record)).await {
                Ok(_) => None,
                Err(err) => Some(Notification::error(err.to_string())),
            },
            Err(SaveError::NotFound(_)) => {
                self.clear().await;
                Some(Notification::not_found(id))
            }
            Err(err) => Some(Notification::error(err.to_string())),
        }
    }

    /// Show `record` in the form, moving to its topic (or to none).
    ///
    /// The previous topic is left before the new one is joined.
    pub async fn populate(
        &mut self,
        record: Option<InventoryRecord>,
    ) -> Result<Option<Visibility>, CollabError> {
        let next = record.as_ref().and_then(Topic::for_record);
        let previous = self.binding.take();
        self.subscription = None;
        self.record = record;

        let (Some(topic), Some(seed)) = (next, self.record.as_ref()) else {
            if let Some(previous) = previous {
                self.registry
                    .unbind(previous.topic(), &self.identity.user_id)
                    .await;
            }
            return Ok(self.presence.clear());
        };

        let binding = match self
            .registry
            .switch(previous.as_ref().map(Binding::topic), &topic, &self.identity, seed)
            .await
        {
            Ok(binding) => binding,
            Err(err) => {
                self.presence.clear();
                return Err(err);
            }
        };
        let subscription = binding.subscribe().await;
        let visibility = self.presence.reset(subscription.roster().to_vec());
        self.binding = Some(binding);
        self.subscription = Some(subscription);
        Ok(visibility)
    }

    /// Start a blank record. It gets no topic until it has been saved.
    pub async fn new_record(&mut self) {
        self.clear().await;
    }

    /// Apply raw form input to `field`.
    ///
    /// Returns an error notification carrying the field message when the
    /// input is rejected. The form keeps its previous value.
    pub async fn edit(&mut self, field: RecordField, raw: &str) -> Option<Notification> {
        let result = match &self.binding {
            Some(binding) => self
                .registry
                .set_field_text(binding.topic(), self.identity.user_id, field, raw)
                .await
                .map(|_| ()),
            None => FieldInput::parse(field, raw)
                .and_then(|value| {
                    self.record
                        .get_or_insert_with(InventoryRecord::new)
                        .set_field(field, value)
                })
                .map_err(CollabError::from),
        };
        match result {
            Ok(()) => None,
            Err(CollabError::Validation(err)) => {
                log::warn!("{} entered invalid {field}: {}", self.identity.user_id, err.message);
                Some(Notification::error(err.message))
            }
            Err(err) => {
                log::warn!("Edit of {field} by {} failed: {err}", self.identity.user_id);
                Some(Notification::error(err.to_string()))
            }
        }
    }

    /// Receive an uploaded image and stage it on the form's record.
    pub async fn upload<St, B>(&mut self, chunks: St) -> Option<Notification>
    where
        St: Stream<Item = Result<B, io::Error>> + Unpin,
        B: AsRef<[u8]>,
    {
        match self.intake.receive(chunks).await {
            Ok(blob) => {
                stage(blob, &mut self.record);
                None
            }
            Err(err) => {
                log::warn!("Upload by {} failed: {err}", self.identity.user_id);
                Some(Notification::error(format!("Upload failed: {err}")))
            }
        }
    }

    /// Persist the form.
    ///
    /// The record is saved with the version it was loaded with, so a commit
    /// made by anybody else in the meantime is reported as a conflict.
    pub async fn save(&mut self) -> Notification {
        let mut record = self.record.clone().unwrap_or_default();
        if let Some(binding) = &self.binding {
            binding.draft().await.write_into(&mut record);
        }

        match self.service.update(&record) {
            Ok(saved) => {
                if let (Some(binding), Some(version)) = (&self.binding, saved.version) {
                    binding
                        .session()
                        .mark_saved(self.identity.user_id, version)
                        .await;
                }
                self.clear().await;
                Notification::info(MSG_SAVED)
            }
            Err(SaveError::Conflict { .. }) => Notification::error(MSG_CONFLICT),
            Err(SaveError::NotFound(missing)) => {
                self.clear().await;
                Notification::not_found(missing.0)
            }
            Err(SaveError::ImageTooLarge { .. } | SaveError::Store(_)) => {
                Notification::error(MSG_INVALID)
            }
        }
    }

    pub async fn cancel(&mut self) {
        self.clear().await;
    }

    /// Leave the current topic and drop the editor.
    pub async fn close(mut self) {
        self.clear().await;
    }

    async fn clear(&mut self) -> Option<Visibility> {
        // Leaving a topic never fails; only joining can
        self.populate(None).await.unwrap_or(None)
    }

    /// Wait for the next event from another participant of the current
    /// topic. `None` when no topic is bound.
    pub async fn next_event(&mut self) -> Option<EditorUpdate> {
        let subscription = self.subscription.as_mut()?;
        let Some(event) = subscription.recv().await else {
            self.subscription = None;
            return None;
        };
        let visibility = match &*event {
            SessionEvent::DraftReset { .. } => match &self.binding {
                Some(binding) => self.presence.reset(binding.roster().await),
                None => None,
            },
            other => self.presence.apply(other),
        };
        Some(EditorUpdate { event, visibility })
    }

    /// The form's values: the shared draft over the loaded record.
    pub async fn current(&self) -> Option<InventoryRecord> {
        let mut record = self.record.clone()?;
        if let Some(binding) = &self.binding {
            binding.draft().await.write_into(&mut record);
        }
        Some(record)
    }

    pub async fn draft(&self) -> Option<SharedDraft> {
        match &self.binding {
            Some(binding) => Some(binding.draft().await),
            None => None,
        }
    }

    /// `data:` URL for the image preview.
    pub fn image_preview(&self) -> Option<String> {
        self.record.as_ref()?.image.as_ref().map(|image| image.data_url())
    }

    pub fn record(&self) -> Option<&InventoryRecord> {
        self.record.as_ref()
    }

    pub fn topic(&self) -> Option<&Topic> {
        self.binding.as_ref().map(Binding::topic)
    }

    pub fn presence(&self) -> &PresenceView {
        &self.presence
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory_core::{InMemoryRecordStore, Version};

    fn editor(store: Arc<InMemoryRecordStore>) -> RecordEditor<InMemoryRecordStore> {
        RecordEditor::new(
            UserIdentity::new("Steve Lange"),
            Arc::new(SessionRegistry::with_defaults()),
            InventoryService::new(store),
        )
    }

    #[tokio::test]
    async fn test_new_record_edits_locally_and_saves() {
        let store = Arc::new(InMemoryRecordStore::new());
        let mut editor = editor(store.clone());
        editor.new_record().await;
        assert!(editor.topic().is_none());

        assert!(editor.edit(RecordField::Name, "Widget").await.is_none());
        assert!(editor.edit(RecordField::Counter, " 12 ").await.is_none());
        assert_eq!(editor.record().and_then(|r| r.counter), Some(12));

        let note = editor.save().await;
        assert_eq!(note, Notification::info(MSG_SAVED));
        assert!(editor.record().is_none());

        let saved = store.get(RecordId(1)).unwrap().unwrap();
        assert_eq!(saved.name.as_deref(), Some("Widget"));
        assert_eq!(saved.version, Some(Version::INITIAL));
    }

    #[tokio::test]
    async fn test_invalid_local_counter_rejected() {
        let mut editor = editor(Arc::new(InMemoryRecordStore::new()));
        assert!(editor.edit(RecordField::Counter, "5").await.is_none());
        let note = editor.edit(RecordField::Counter, "abc").await.unwrap();
        assert_eq!(note, Notification::error("Only numbers are allowed"));
        assert_eq!(editor.record().and_then(|r| r.counter), Some(5));
    }

    #[tokio::test]
    async fn test_open_binds_topic() {
        let store = Arc::new(InMemoryRecordStore::with_records(vec![InventoryRecord {
            id: Some(RecordId(42)),
            version: Some(Version(3)),
            ..InventoryRecord::default()
        }]));
        let mut editor = editor(store);
        assert!(editor.open(RecordId(42)).await.is_none());
        assert_eq!(editor.topic(), Some(&Topic::of(RecordId(42))));
        assert!(editor.presence().is_visible());
        assert_eq!(editor.presence().label(), "1 person editing");

        editor.cancel().await;
        assert!(editor.topic().is_none());
        assert!(!editor.presence().is_visible());
    }

    #[test]
    fn test_notification_levels() {
        assert!(Notification::not_found(RecordId(7)).is_error());
        assert_eq!(
            Notification::not_found(RecordId(7)).message,
            "The requested record was not found, ID = 7"
        );
        assert!(!Notification::info(MSG_SAVED).is_error());
    }
}
