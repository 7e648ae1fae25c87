//! Integration tests for shared-draft synchronization across participants
//! and the save path through the version guard.

use std::sync::Arc;

use inventory_collab::{
    CollabError, RecordEditor, SessionEvent, SessionRegistry, Topic, UserIdentity,
};
use inventory_collab::editor::{MSG_CONFLICT, MSG_SAVED};
use inventory_core::{
    FieldValue, InMemoryRecordStore, InventoryRecord, InventoryService, RecordField, RecordId,
    RecordStore, Version,
};
use tokio::time::{timeout, Duration};

fn record_42() -> InventoryRecord {
    InventoryRecord {
        id: Some(RecordId(42)),
        version: Some(Version(3)),
        name: Some("Gadget".into()),
        category: Some("tools".into()),
        counter: Some(5),
        image: None,
    }
}

async fn bound_pair(registry: &SessionRegistry) -> (Topic, UserIdentity, UserIdentity) {
    let topic = Topic::of(RecordId(42));
    let u1 = UserIdentity::new("User One");
    let u2 = UserIdentity::new("User Two");
    registry.bind(&topic, &u1, &record_42()).await.unwrap();
    registry.bind(&topic, &u2, &record_42()).await.unwrap();
    (topic, u1, u2)
}

#[tokio::test]
async fn test_edits_to_different_fields_both_survive() {
    let registry = Arc::new(SessionRegistry::with_defaults());
    let (topic, u1, u2) = bound_pair(&registry).await;

    let a = {
        let registry = registry.clone();
        let topic = topic.clone();
        tokio::spawn(async move {
            registry
                .set_field_text(&topic, u1.user_id, RecordField::Name, "Widget")
                .await
        })
    };
    let b = {
        let registry = registry.clone();
        let topic = topic.clone();
        tokio::spawn(async move {
            registry
                .set_field_text(&topic, u2.user_id, RecordField::Category, "hardware")
                .await
        })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let draft = registry.draft_of(&topic).await.unwrap();
    assert_eq!(draft.name(), Some("Widget"));
    assert_eq!(draft.category(), Some("hardware"));
    assert_eq!(draft.counter(), Some(5));
}

#[tokio::test]
async fn test_same_field_last_applied_write_wins() {
    let registry = SessionRegistry::with_defaults();
    let (topic, u1, u2) = bound_pair(&registry).await;
    let mut observer = registry.subscribe(&topic, u2.user_id).await.unwrap();

    let first = registry
        .set_field(&topic, u1.user_id, RecordField::Counter, FieldValue::Number(Some(7)))
        .await
        .unwrap();
    let second = registry
        .set_field(&topic, u2.user_id, RecordField::Counter, FieldValue::Number(Some(9)))
        .await
        .unwrap();
    assert!(second > first);

    let draft = registry.draft_of(&topic).await.unwrap();
    assert_eq!(draft.counter(), Some(9));
    assert_eq!(draft.last_write(RecordField::Counter), Some(second));

    // u2 only hears about u1's write, not its own
    let event = timeout(Duration::from_secs(1), observer.recv()).await.unwrap().unwrap();
    assert!(matches!(
        &*event,
        SessionEvent::FieldChanged { seq, origin, .. } if *seq == first && *origin == u1.user_id
    ));
}

#[tokio::test]
async fn test_non_numeric_counter_keeps_previous_value() {
    let registry = SessionRegistry::with_defaults();
    let (topic, u1, _u2) = bound_pair(&registry).await;

    let err = registry
        .set_field_text(&topic, u1.user_id, RecordField::Counter, "abc")
        .await
        .unwrap_err();
    match err {
        CollabError::Validation(e) => assert_eq!(e.message, "Only numbers are allowed"),
        other => panic!("expected validation error, got {other:?}"),
    }

    registry
        .set_field_text(&topic, u1.user_id, RecordField::Name, "Still editable")
        .await
        .unwrap();
    let draft = registry.draft_of(&topic).await.unwrap();
    assert_eq!(draft.counter(), Some(5));
    assert_eq!(draft.name(), Some("Still editable"));
}

#[tokio::test]
async fn test_broadcast_order_matches_application_order() {
    let registry = SessionRegistry::with_defaults();
    let (topic, u1, u2) = bound_pair(&registry).await;
    let mut observer = registry.subscribe(&topic, u2.user_id).await.unwrap();

    for n in 0..50 {
        registry
            .set_field(&topic, u1.user_id, RecordField::Counter, FieldValue::Number(Some(n)))
            .await
            .unwrap();
    }

    let mut last_seq = 0;
    let mut last_value = None;
    for _ in 0..50 {
        let event = timeout(Duration::from_secs(1), observer.recv()).await.unwrap().unwrap();
        if let SessionEvent::FieldChanged { seq, value, .. } = &*event {
            assert!(*seq > last_seq);
            last_seq = *seq;
            last_value = Some(value.clone());
        }
    }
    assert_eq!(last_value, Some(FieldValue::Number(Some(49))));
    assert_eq!(registry.stats().await.field_updates, 50);
}

#[tokio::test]
async fn test_end_to_end_conflicting_save() {
    let store = Arc::new(InMemoryRecordStore::with_records(vec![record_42()]));
    let registry = Arc::new(SessionRegistry::with_defaults());
    let mut u1 = RecordEditor::new(
        UserIdentity::new("User One"),
        registry.clone(),
        InventoryService::new(store.clone()),
    );
    let mut u2 = RecordEditor::new(
        UserIdentity::new("User Two"),
        registry.clone(),
        InventoryService::new(store.clone()),
    );

    assert!(u1.open(RecordId(42)).await.is_none());
    assert!(u2.open(RecordId(42)).await.is_none());
    let topic = Topic::of(RecordId(42));
    assert_eq!(u1.topic(), Some(&topic));
    assert_eq!(registry.roster_of(&topic).await.len(), 2);

    assert!(u1.edit(RecordField::Name, "Widget").await.is_none());

    // u2 sees the change on the shared topic (after u1's join event)
    let mut saw_name = false;
    while !saw_name {
        let update = timeout(Duration::from_secs(1), u2.next_event()).await.unwrap().unwrap();
        if let SessionEvent::FieldChanged { field, value, .. } = &*update.event {
            assert_eq!(*field, RecordField::Name);
            assert_eq!(*value, FieldValue::Text(Some("Widget".into())));
            saw_name = true;
        }
    }
    let shown = u2.current().await.unwrap();
    assert_eq!(shown.name.as_deref(), Some("Widget"));

    let note = u1.save().await;
    assert_eq!(note.message, MSG_SAVED);
    let stored = store.get(RecordId(42)).unwrap().unwrap();
    assert_eq!(stored.version, Some(Version(4)));
    assert_eq!(stored.name.as_deref(), Some("Widget"));

    // The commit reaches u2 and the shared draft now builds on it
    let update = timeout(Duration::from_secs(1), u2.next_event()).await.unwrap().unwrap();
    assert!(matches!(*update.event, SessionEvent::Saved { version: Version(4), .. }));
    let draft = registry.draft_of(&topic).await.unwrap();
    assert_eq!(draft.base_version(), Some(Version(4)));

    // u2 still holds version 3
    assert_eq!(u2.record().unwrap().version, Some(Version(3)));
    let note = u2.save().await;
    assert!(note.is_error());
    assert_eq!(note.message, MSG_CONFLICT);
    assert_eq!(u2.topic(), Some(&topic), "form is kept after a conflict");

    // Reload picks up version 4 and the save goes through
    assert!(u2.reload().await.is_none());
    assert!(u2.edit(RecordField::Counter, "6").await.is_none());
    assert_eq!(u2.save().await.message, MSG_SAVED);
    assert_eq!(store.get(RecordId(42)).unwrap().unwrap().version, Some(Version(5)));
    assert_eq!(registry.topic_count().await, 0);
}

#[tokio::test]
async fn test_events_encode_for_external_transport() {
    let registry = SessionRegistry::with_defaults();
    let (topic, u1, u2) = bound_pair(&registry).await;
    let mut observer = registry.subscribe(&topic, u2.user_id).await.unwrap();
    registry
        .set_field_text(&topic, u1.user_id, RecordField::Name, "Widget")
        .await
        .unwrap();

    let event = timeout(Duration::from_secs(1), observer.recv()).await.unwrap().unwrap();
    let bytes = event.encode().unwrap();
    assert_eq!(SessionEvent::decode(&bytes).unwrap(), *event);
}
