use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, Utc};
use stockroom_core::{ActivityId, ItemId, UserId};
use stockroom_events::execute;
use stockroom_inventory::ledger::{self, AdjustAction, Quantity, RemovalGuard};
use stockroom_inventory::{
    ActionType, ActivityAction, ActivityChanges, ActivityRecord, AdjustStock, InventoryCommand,
    InventoryItem, Provenance, SaveAdjustment, StockLocationEntry, narrate_timeline,
};

fn tracked_item(locations: usize) -> InventoryItem {
    let entries: Vec<_> = (0..locations)
        .map(|i| StockLocationEntry::new(format!("Bin {i}"), 100))
        .collect();
    let stock = ledger::location_total(&entries);
    InventoryItem::restore(ItemId::new(), "Fuses", stock, entries, 1)
}

fn adjust_command(item: &InventoryItem, location: &str) -> InventoryCommand {
    let quantity = Quantity::new(1).unwrap();
    InventoryCommand::AdjustStock(AdjustStock {
        request: SaveAdjustment {
            item_id: item.id_typed(),
            new_stock: ledger::compute_new_total(item, AdjustAction::Remove, quantity),
            quantity: quantity.get(),
            action: AdjustAction::Remove,
            location: Some(location.to_string()),
            parent_location: None,
            provenance: Provenance::default(),
            expected_revision: None,
        },
        user_id: Some(UserId::new()),
        guard: RemovalGuard::Enforced,
        occurred_at: Utc::now(),
    })
}

fn bench_commit_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_latency");

    for locations in [1usize, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("remove_from_last_location", locations),
            locations,
            |b, &n| {
                let item = tracked_item(n);
                let last = format!("Bin {}", n - 1);
                let cmd = adjust_command(&item, &last);
                b.iter(|| {
                    let mut working = item.clone();
                    black_box(execute(&mut working, black_box(&cmd)).unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_timeline_narration(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeline_narration");

    for size in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("narrate", size), size, |b, &n| {
            let t0 = Utc::now();
            let item_id = ItemId::new();
            // Reverse chronological input forces the sort to do work.
            let records: Vec<ActivityRecord> = (0..n)
                .rev()
                .map(|i| {
                    ActivityRecord::new(
                        ActivityId::new(),
                        item_id,
                        None,
                        ActivityAction::Updated,
                        "Fuses",
                        ActivityChanges {
                            old_stock: Some(i as u64 + 1),
                            stock: Some(i as u64),
                            action_type: Some(ActionType::Remove),
                            location: Some("Bin 0".to_string()),
                            ..ActivityChanges::default()
                        },
                        t0 + Duration::seconds(i as i64),
                    )
                })
                .collect();

            b.iter(|| black_box(narrate_timeline(records.iter())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_commit_latency, bench_timeline_narration);
criterion_main!(benches);
