mod common;

use std::{sync::Arc, thread};

use bill_ledger::{
    core::{
        services::{DueDateInfo, DueDateProjector},
        BillSession, CacheState, ChangeOutcome, DueDateCache, FixedClock,
    },
    errors::ScheduleError,
    ledger::{Bill, Calendar, PeriodUnit, TimeInterval, TimeUnit},
    storage::{BillChange, MemoryBillStore},
};
use common::{date, FlakyStore};

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(date(2025, 3, 15)))
}

fn rent() -> Bill {
    Bill::new("Rent", 1200.0, date(2025, 1, 1), PeriodUnit::Monthly)
}

#[test]
fn reset_loads_one_entry_per_bill() {
    let bills = vec![
        rent(),
        Bill::new("Water", 40.0, date(2025, 1, 20), PeriodUnit::Monthly),
        Bill::new("Lease", 800.0, date(2024, 1, 1), PeriodUnit::Monthly)
            .with_end_date(date(2024, 12, 1)),
    ];
    let store = Arc::new(MemoryBillStore::with_bills(bills.clone()));
    let cache = DueDateCache::new(store, DueDateProjector::default(), clock());

    assert_eq!(cache.reset().unwrap(), 3);
    let state = cache.state();
    assert_eq!(state.entries().map(|map| map.len()), Some(3));
    assert_eq!(
        cache.fetch_against(bills[0].id),
        Some(DueDateInfo::DueOn(date(2025, 4, 1)))
    );
    assert_eq!(
        cache.fetch_against(bills[1].id),
        Some(DueDateInfo::DueOn(date(2025, 3, 20)))
    );
    assert_eq!(cache.fetch_against(bills[2].id), Some(DueDateInfo::Expired));
}

#[test]
fn deleting_the_only_bill_leaves_an_empty_map() {
    let bill = rent();
    let store = Arc::new(MemoryBillStore::with_bills([bill.clone()]));
    let cache = DueDateCache::new(Arc::clone(&store), DueDateProjector::default(), clock());
    cache.reset().unwrap();

    store.delete(bill.id).unwrap();
    let outcome = cache.apply_change(&BillChange::deleted(bill.id));

    assert_eq!(
        outcome,
        ChangeOutcome::Applied {
            recomputed: 0,
            removed: 1,
            skipped: 0
        }
    );
    let state = cache.state();
    assert!(state.is_loaded());
    assert!(state.entries().unwrap().is_empty());
}

#[test]
fn inserted_bill_matches_direct_projection() {
    let store = Arc::new(MemoryBillStore::new());
    let cache = DueDateCache::new(Arc::clone(&store), DueDateProjector::default(), clock());
    cache.reset().unwrap();

    let bill = Bill::new("Phone", 45.0, date(2024, 12, 31), PeriodUnit::Monthly);
    let id = store.insert(bill.clone());
    cache.apply_change(&BillChange::inserted(id));

    let direct = DueDateProjector::default()
        .due_date_info(&bill, date(2025, 3, 15))
        .unwrap();
    assert_eq!(cache.fetch_against(id), Some(direct));
    assert_eq!(direct, DueDateInfo::DueOn(date(2025, 3, 31)));
}

#[test]
fn updated_bill_is_recomputed() {
    let mut bill = rent();
    let store = Arc::new(MemoryBillStore::with_bills([bill.clone()]));
    let cache = DueDateCache::new(Arc::clone(&store), DueDateProjector::default(), clock());
    cache.reset().unwrap();

    bill.end_date = Some(date(2025, 3, 1));
    store.update(bill.clone()).unwrap();
    cache.apply_change(&BillChange::updated(bill.id));

    assert_eq!(cache.fetch_against(bill.id), Some(DueDateInfo::Expired));
}

#[test]
fn failing_recompute_keeps_previous_entry() {
    let mut bill = rent();
    let store = Arc::new(MemoryBillStore::with_bills([bill.clone()]));
    let cache = DueDateCache::new(Arc::clone(&store), DueDateProjector::default(), clock());
    cache.reset().unwrap();

    bill.period = PeriodUnit::Custom(TimeInterval::new(0, TimeUnit::Week));
    store.update(bill.clone()).unwrap();
    let vanished = uuid::Uuid::new_v4();
    let outcome = cache.apply_change(&BillChange {
        updated: vec![bill.id, vanished],
        ..BillChange::default()
    });

    assert_eq!(
        outcome,
        ChangeOutcome::Applied {
            recomputed: 0,
            removed: 0,
            skipped: 2
        }
    );
    assert_eq!(
        cache.fetch_against(bill.id),
        Some(DueDateInfo::DueOn(date(2025, 4, 1)))
    );
    assert_eq!(cache.fetch_against(vanished), None);
}

#[test]
fn changes_are_dropped_while_loading() {
    let store = Arc::new(MemoryBillStore::new());
    let cache = DueDateCache::new(Arc::clone(&store), DueDateProjector::default(), clock());
    let id = store.insert(rent());
    assert_eq!(
        cache.apply_change(&BillChange::inserted(id)),
        ChangeOutcome::Dropped
    );
    assert_eq!(*cache.state(), CacheState::Loading);
}

#[test]
fn error_state_drops_changes_until_reset_succeeds() {
    let bill = rent();
    let store = Arc::new(FlakyStore::with_bills([bill.clone()]));
    let cache = DueDateCache::new(Arc::clone(&store), DueDateProjector::default(), clock());
    cache.reset().unwrap();

    store.set_failing(true);
    let err = cache.reset().expect_err("store is offline");
    assert!(matches!(err, ScheduleError::StoreFetchFailed(_)));
    assert!(matches!(*cache.state(), CacheState::Error(_)));
    assert_eq!(cache.fetch_against(bill.id), None, "prior snapshot is discarded");

    store.set_failing(false);
    let added = store.inner.insert(Bill::new(
        "Water",
        40.0,
        date(2025, 1, 20),
        PeriodUnit::Monthly,
    ));
    assert_eq!(
        cache.apply_change(&BillChange::inserted(added)),
        ChangeOutcome::Dropped
    );
    assert!(matches!(*cache.state(), CacheState::Error(_)));

    assert_eq!(cache.reset().unwrap(), 2);
    assert_eq!(
        cache.fetch_against(added),
        Some(DueDateInfo::DueOn(date(2025, 3, 20)))
    );
}

#[test]
fn concurrent_readers_only_see_complete_snapshots() {
    let bills: Vec<_> = (0..50)
        .map(|idx| {
            Bill::new(
                format!("Bill {idx}"),
                10.0,
                date(2025, 1, 1 + (idx % 28) as u32),
                PeriodUnit::Monthly,
            )
        })
        .collect();
    let store = Arc::new(MemoryBillStore::with_bills(bills.clone()));
    let cache = Arc::new(DueDateCache::new(
        Arc::clone(&store),
        DueDateProjector::default(),
        clock(),
    ));
    cache.reset().unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..200 {
                    let snapshot = cache.state();
                    let len = snapshot.entries().map(|map| map.len()).unwrap_or(0);
                    assert!(len == 50 || len == 49 || len == 0, "partial snapshot of {len}");
                }
            })
        })
        .collect();

    for bill in &bills {
        store.delete(bill.id).unwrap();
        store.insert(bill.clone());
        cache.apply_change(&BillChange {
            deleted: vec![bill.id],
            ..BillChange::default()
        });
        cache.apply_change(&BillChange::inserted(bill.id));
    }

    for reader in readers {
        reader.join().expect("reader thread");
    }
    assert_eq!(cache.state().entries().map(|map| map.len()), Some(50));
}

#[test]
fn session_syncs_store_changes() {
    let store = Arc::new(MemoryBillStore::new());
    let session = BillSession::open(Arc::clone(&store), DueDateProjector::default(), clock());
    let cache = session.cache();
    assert!(cache.state().is_loaded());

    let first = store.insert(rent());
    let second = store.insert(Bill::new(
        "Insurance",
        90.0,
        date(2025, 2, 10),
        PeriodUnit::Monthly,
    ));
    assert_eq!(cache.fetch_against(first), None, "not synced yet");

    let report = session.sync().unwrap();
    assert_eq!(report.applied, 2);
    assert!(!report.reloaded);
    assert_eq!(
        cache.fetch_against(second),
        Some(DueDateInfo::DueOn(date(2025, 4, 10)))
    );

    session.close();
    assert_eq!(*cache.state(), CacheState::Loading);
}

#[test]
fn session_reloads_after_failed_open() {
    let store = Arc::new(FlakyStore::with_bills([rent()]));
    store.set_failing(true);
    let session = BillSession::open(
        Arc::clone(&store),
        DueDateProjector::new(Calendar::default(), 1_000),
        clock(),
    );
    assert!(matches!(*session.cache().state(), CacheState::Error(_)));

    store.set_failing(false);
    store.inner.insert(Bill::new(
        "Water",
        40.0,
        date(2025, 1, 20),
        PeriodUnit::Monthly,
    ));
    let report = session.sync().unwrap();
    assert!(report.reloaded);
    assert_eq!(
        session.cache().state().entries().map(|map| map.len()),
        Some(2)
    );
}
