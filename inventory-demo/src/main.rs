//! Two users editing record 42 at the same time.
//!
//! Run with `RUST_LOG=info cargo run -p inventory-demo`.

use std::io;
use std::sync::Arc;

use futures_util::stream;
use inventory_collab::{
    Notification, NotificationLevel, RecordEditor, SessionEvent, SessionRegistry, UserIdentity,
};
use inventory_core::{
    InMemoryRecordStore, InventoryRecord, InventoryService, RecordField, RecordFilter, RecordId,
    SortOrder, SortField, Version,
};
use log::info;

fn show(who: &str, note: Option<Notification>) {
    let Some(note) = note else { return };
    match note.level {
        NotificationLevel::Info => info!("[{who}] {}", note.message),
        NotificationLevel::Error => log::error!("[{who}] {}", note.message),
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let store = Arc::new(InMemoryRecordStore::with_records(vec![
        InventoryRecord {
            id: Some(RecordId(42)),
            version: Some(Version(3)),
            name: Some("Gadget".into()),
            category: Some("tools".into()),
            counter: Some(5),
            image: None,
        },
        InventoryRecord {
            id: Some(RecordId(7)),
            name: Some("Anvil".into()),
            category: Some("tools".into()),
            counter: Some(1),
            ..InventoryRecord::default()
        },
    ]));
    let registry = Arc::new(SessionRegistry::with_defaults());
    let service = InventoryService::new(store.clone());

    let mut u1 = RecordEditor::new(UserIdentity::new("User One"), registry.clone(), service.clone());
    let mut u2 = RecordEditor::new(UserIdentity::new("User Two"), registry.clone(), service.clone());

    show("u1", u1.open(RecordId(42)).await);
    show("u2", u2.open(RecordId(42)).await);
    let avatars: Vec<String> = u2.presence().avatars().into_iter().map(|a| a.initials).collect();
    info!("[u2] avatar group: {} ({})", u2.presence().label(), avatars.join(", "));

    show("u1", u1.edit(RecordField::Name, "Widget").await);
    show("u2", u2.edit(RecordField::Counter, "abc").await);

    while let Some(update) = u2.next_event().await {
        if let SessionEvent::FieldChanged { field, value, .. } = &*update.event {
            info!("[u2] sees {field} = {value:?}");
            break;
        }
    }

    let image = stream::iter(vec![Ok::<_, io::Error>(vec![0x89, b'P', b'N', b'G'])]);
    show("u1", u1.upload(image).await);
    show("u1", Some(u1.save().await));
    show("u2", Some(u2.save().await));
    show("u2", u2.reload().await);
    show("u2", Some(u2.save().await));

    show("u1", u1.open(RecordId(99)).await);

    match service.list(
        0,
        10,
        &[SortOrder::asc(SortField::Name)],
        &RecordFilter::default(),
    ) {
        Ok(page) => {
            for record in &page.items {
                info!(
                    "grid: {:?} {:?} {:?} v{:?} image {} bytes",
                    record.id,
                    record.name,
                    record.counter,
                    record.version.map(|v| v.0),
                    record.image_len()
                );
            }
        }
        Err(e) => log::error!("grid query failed: {e}"),
    }

    let stats = registry.stats().await;
    info!("registry: {stats:?}");
    u1.close().await;
    u2.close().await;
}
