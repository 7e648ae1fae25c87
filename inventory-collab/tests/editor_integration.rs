//! Editor command handlers: not-found fallback, uploads, save outcomes and
//! topic lifecycle.

use std::io;
use std::sync::Arc;

use futures_util::stream;
use inventory_collab::editor::{MSG_INVALID, MSG_SAVED};
use inventory_collab::{
    NotificationLevel, RecordEditor, SessionRegistry, Topic, UserIdentity, Visibility,
};
use inventory_core::{
    ImageBlob, InMemoryRecordStore, InventoryRecord, InventoryService, RecordField, RecordId,
    RecordStore, Version, IMAGE_MAX_BYTES,
};

struct Fixture {
    store: Arc<InMemoryRecordStore>,
    registry: Arc<SessionRegistry>,
}

impl Fixture {
    fn new(records: Vec<InventoryRecord>) -> Self {
        Self {
            store: Arc::new(InMemoryRecordStore::with_records(records)),
            registry: Arc::new(SessionRegistry::with_defaults()),
        }
    }

    fn editor(&self, name: &str) -> RecordEditor<InMemoryRecordStore> {
        RecordEditor::new(
            UserIdentity::new(name),
            self.registry.clone(),
            InventoryService::new(self.store.clone()),
        )
    }
}

fn stored(id: u64) -> InventoryRecord {
    InventoryRecord {
        id: Some(RecordId(id)),
        version: Some(Version(1)),
        name: Some(format!("item-{id}")),
        counter: Some(1),
        image: Some(ImageBlob::new(vec![0xAA; 16])),
        ..InventoryRecord::default()
    }
}

fn chunks(parts: Vec<Vec<u8>>) -> impl futures_util::Stream<Item = Result<Vec<u8>, io::Error>> + Unpin {
    stream::iter(parts.into_iter().map(Ok))
}

#[tokio::test]
async fn test_open_deleted_record_falls_back_to_empty_form() {
    let fixture = Fixture::new(vec![stored(5)]);
    let mut editor = fixture.editor("Alice");
    assert!(editor.open(RecordId(5)).await.is_none());

    fixture.store.delete(RecordId(5)).unwrap();

    let note = fixture.editor("Carol").open(RecordId(5)).await.unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(note.message, "The requested record was not found, ID = 5");

    // Alice's save against the deleted row also lands on the not-found path
    let note = editor.save().await;
    assert_eq!(note.message, "The requested record was not found, ID = 5");
    assert!(editor.record().is_none());
    assert!(editor.topic().is_none());
}

#[tokio::test]
async fn test_open_unknown_id_clears_previous_topic() {
    let fixture = Fixture::new(vec![stored(1)]);
    let mut editor = fixture.editor("Alice");
    editor.open(RecordId(1)).await;
    assert_eq!(fixture.registry.topic_count().await, 1);

    let note = editor.open(RecordId(99)).await.unwrap();
    assert!(note.is_error());
    assert!(editor.record().is_none());
    assert!(!editor.presence().is_visible());
    assert_eq!(fixture.registry.topic_count().await, 0);
}

#[tokio::test]
async fn test_second_upload_replaces_first() {
    let fixture = Fixture::new(vec![stored(1)]);
    let mut editor = fixture.editor("Alice");
    editor.open(RecordId(1)).await;

    assert!(editor.upload(chunks(vec![vec![1; 100], vec![2; 100]])).await.is_none());
    assert!(editor.upload(chunks(vec![vec![3; 4]])).await.is_none());
    assert_eq!(editor.record().unwrap().image.as_ref().unwrap().as_bytes(), &[3, 3, 3, 3]);
    assert_eq!(editor.image_preview().as_deref(), Some("data:image;base64,AwMDAw=="));

    assert_eq!(editor.save().await.message, MSG_SAVED);
    let saved = fixture.store.get(RecordId(1)).unwrap().unwrap();
    assert_eq!(saved.image_len(), 4);
}

#[tokio::test]
async fn test_upload_without_record_instantiates_one() {
    let fixture = Fixture::new(vec![]);
    let mut editor = fixture.editor("Alice");
    editor.new_record().await;

    assert!(editor.upload(chunks(vec![vec![9; 8]])).await.is_none());
    let record = editor.record().unwrap();
    assert!(!record.is_persisted());
    assert_eq!(record.image_len(), 8);
    assert!(editor.topic().is_none());
}

#[tokio::test]
async fn test_failed_upload_keeps_staged_image() {
    let fixture = Fixture::new(vec![stored(1)]);
    let mut editor = fixture.editor("Alice");
    editor.open(RecordId(1)).await;

    let broken = stream::iter(vec![
        Ok(vec![1u8; 32]),
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "client went away")),
    ]);
    let note = editor.upload(broken).await.unwrap();
    assert!(note.is_error());
    assert_eq!(editor.record().unwrap().image.as_ref().unwrap().as_bytes(), &[0xAA; 16]);
}

#[tokio::test]
async fn test_oversized_image_reports_invalid_values() {
    let fixture = Fixture::new(vec![stored(1)]);
    let mut editor = fixture.editor("Alice");
    editor.open(RecordId(1)).await;
    editor
        .upload(chunks(vec![vec![0; IMAGE_MAX_BYTES + 1]]))
        .await;

    let note = editor.save().await;
    assert_eq!(note.message, MSG_INVALID);
    // The form stays so the user can pick another image
    assert_eq!(editor.topic(), Some(&Topic::of(RecordId(1))));
}

#[tokio::test]
async fn test_cancel_and_close_unbind() {
    let fixture = Fixture::new(vec![stored(1)]);
    let mut alice = fixture.editor("Alice");
    let mut bob = fixture.editor("Bob");
    alice.open(RecordId(1)).await;
    bob.open(RecordId(1)).await;
    let topic = Topic::of(RecordId(1));
    assert_eq!(fixture.registry.roster_of(&topic).await.len(), 2);

    let update = alice.next_event().await.unwrap();
    assert_eq!(update.visibility, None);
    assert_eq!(alice.presence().label(), "2 people editing");

    bob.cancel().await;
    assert_eq!(fixture.registry.roster_of(&topic).await.len(), 1);
    alice.next_event().await.unwrap();
    assert_eq!(alice.presence().roster().len(), 1);

    alice.close().await;
    assert!(fixture.registry.roster_of(&topic).await.is_empty());
    assert_eq!(fixture.registry.topic_count().await, 0);
}

#[tokio::test]
async fn test_switching_records_moves_topic() {
    let fixture = Fixture::new(vec![stored(1), stored(2)]);
    let mut editor = fixture.editor("Alice");
    editor.open(RecordId(1)).await;
    editor.open(RecordId(2)).await;

    assert_eq!(editor.topic(), Some(&Topic::of(RecordId(2))));
    assert!(fixture.registry.roster_of(&Topic::of(RecordId(1))).await.is_empty());
    assert_eq!(fixture.registry.topic_count().await, 1);

    let hidden = editor.populate(None).await.unwrap();
    assert_eq!(hidden, Some(Visibility::Hidden));
}

#[tokio::test]
async fn test_unsaved_edits_stay_local() {
    let fixture = Fixture::new(vec![]);
    let mut editor = fixture.editor("Alice");
    assert!(editor.edit(RecordField::Name, "Draft only").await.is_none());
    assert!(editor.image_preview().is_none());
    assert_eq!(fixture.registry.topic_count().await, 0);
    assert_eq!(editor.save().await.message, MSG_SAVED);
    assert_eq!(fixture.store.count().unwrap(), 1);
}

#[tokio::test]
async fn test_rejected_shared_edit_reports_field_message() {
    let fixture = Fixture::new(vec![stored(3)]);
    let mut editor = fixture.editor("Alice");
    assert!(editor.open(RecordId(3)).await.is_none());

    let note = editor.edit(RecordField::Counter, "abc").await.unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(note.message, "Only numbers are allowed");

    let draft = fixture.registry.draft_of(&Topic::of(RecordId(3))).await.unwrap();
    assert_eq!(draft.counter(), Some(1));
    assert_eq!(fixture.registry.stats().await.rejected_edits, 1);
}
