use criterion::{black_box, criterion_group, criterion_main, Criterion};
use inventory_core::{
    InMemoryRecordStore, InventoryRecord, PageRequest, RecordFilter, RecordStore, SortField,
    SortOrder,
};

fn seeded_store(rows: usize) -> InMemoryRecordStore {
    InMemoryRecordStore::with_records((0..rows).map(|i| InventoryRecord {
        name: Some(format!("item-{i}")),
        category: Some(if i % 3 == 0 { "tools" } else { "parts" }.into()),
        counter: Some(i as i32),
        ..InventoryRecord::default()
    }))
}

fn bench_save_update(c: &mut Criterion) {
    let store = seeded_store(1);
    let mut record = store.query(&PageRequest::of(0, 1)).unwrap().items.remove(0);

    c.bench_function("save_versioned_update", |b| {
        b.iter(|| {
            record = store.save(black_box(&record)).unwrap();
        })
    });
}

fn bench_query_page(c: &mut Criterion) {
    let store = seeded_store(10_000);
    let request = PageRequest::of(3, 50)
        .sorted_by(SortOrder::desc(SortField::Counter))
        .filtered(RecordFilter {
            category_contains: Some("tools".into()),
            ..RecordFilter::default()
        });

    c.bench_function("query_page_10k_filtered", |b| {
        b.iter(|| {
            black_box(store.query(black_box(&request)).unwrap());
        })
    });
}

criterion_group!(benches, bench_save_update, bench_query_page);
criterion_main!(benches);
