//! Materialized due dates kept in step with a bill store.
//!
//! All mutations go through a single writer lock. Each mutation builds a fresh
//! map and publishes it as a new [`CacheState`] snapshot, so readers holding an
//! `Arc<CacheState>` never observe a half-applied change.

use std::{
    collections::HashMap,
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc, Mutex, PoisonError, RwLock,
    },
};

use crate::{
    core::{
        services::{DueDateInfo, DueDateProjector},
        time::Clock,
    },
    errors::ScheduleError,
    ledger::BillId,
    storage::{BillChange, BillStore},
};

pub type DueDateMap = HashMap<BillId, DueDateInfo>;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheState {
    Loading,
    Loaded(Arc<DueDateMap>),
    Error(String),
}

impl CacheState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, CacheState::Loaded(_))
    }

    pub fn entries(&self) -> Option<&DueDateMap> {
        match self {
            CacheState::Loaded(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, id: BillId) -> Option<DueDateInfo> {
        self.entries().and_then(|map| map.get(&id).copied())
    }
}

/// Result of feeding one [`BillChange`] to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    Applied {
        recomputed: usize,
        removed: usize,
        skipped: usize,
    },
    /// The cache was not loaded; a `reset` is required before changes apply.
    Dropped,
}

pub struct DueDateCache<S: BillStore + ?Sized> {
    store: Arc<S>,
    projector: DueDateProjector,
    clock: Arc<dyn Clock>,
    writer: Mutex<()>,
    state: RwLock<Arc<CacheState>>,
    listeners: Mutex<Vec<Sender<Arc<CacheState>>>>,
}

impl<S: BillStore + ?Sized> DueDateCache<S> {
    pub fn new(store: Arc<S>, projector: DueDateProjector, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            projector,
            clock,
            writer: Mutex::new(()),
            state: RwLock::new(Arc::new(CacheState::Loading)),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> Arc<CacheState> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn fetch_against(&self, id: BillId) -> Option<DueDateInfo> {
        self.state().get(id)
    }

    /// Receives every snapshot published after this call.
    pub fn subscribe(&self) -> Receiver<Arc<CacheState>> {
        let (tx, rx) = mpsc::channel();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Recomputes every due date from a fresh fetch of the store.
    ///
    /// Returns the number of cached entries. A failed fetch moves the cache to
    /// [`CacheState::Error`] and discards the previous snapshot.
    pub fn reset(&self) -> Result<usize, ScheduleError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let bills = match self.store.fetch_all() {
            Ok(bills) => bills,
            Err(err) => {
                tracing::warn!("due date cache reset failed: {err}");
                self.publish(CacheState::Error(err.to_string()));
                return Err(ScheduleError::StoreFetchFailed(err));
            }
        };
        let entries = self.projector.all_due_dates(&bills, self.clock.today());
        let count = entries.len();
        tracing::debug!(bills = bills.len(), entries = count, "due date cache loaded");
        self.publish(CacheState::Loaded(Arc::new(entries)));
        Ok(count)
    }

    /// Folds a store change into the loaded snapshot.
    ///
    /// Bills that cannot be refetched or projected keep their previous entry.
    pub fn apply_change(&self, change: &BillChange) -> ChangeOutcome {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.state();
        let Some(entries) = current.entries() else {
            tracing::warn!(
                inserted = change.inserted.len(),
                updated = change.updated.len(),
                deleted = change.deleted.len(),
                "due date cache not loaded; dropping change until reset"
            );
            return ChangeOutcome::Dropped;
        };

        let mut next = entries.clone();
        let mut removed = 0;
        for id in &change.deleted {
            if next.remove(id).is_some() {
                removed += 1;
            }
        }

        let today = self.clock.today();
        let mut recomputed = 0;
        let mut skipped = 0;
        for id in change.touched() {
            let bill = match self.store.fetch_by_id(*id) {
                Ok(Some(bill)) => bill,
                Ok(None) => {
                    tracing::warn!(bill = %id, "bill disappeared before recompute");
                    skipped += 1;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(bill = %id, "bill fetch failed: {err}");
                    skipped += 1;
                    continue;
                }
            };
            match self.projector.due_date_info(&bill, today) {
                Ok(info) => {
                    next.insert(*id, info);
                    recomputed += 1;
                }
                Err(err) => {
                    tracing::warn!(bill = %id, "keeping previous due date: {err}");
                    skipped += 1;
                }
            }
        }

        tracing::debug!(recomputed, removed, skipped, "due date cache updated");
        self.publish(CacheState::Loaded(Arc::new(next)));
        ChangeOutcome::Applied {
            recomputed,
            removed,
            skipped,
        }
    }

    /// Returns the cache to [`CacheState::Loading`], releasing the snapshot.
    pub fn invalidate(&self) {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.publish(CacheState::Loading);
    }

    fn publish(&self, state: CacheState) -> Arc<CacheState> {
        let snapshot = Arc::new(state);
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&snapshot);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::FixedClock;
    use crate::ledger::{Bill, PeriodUnit};
    use crate::storage::MemoryBillStore;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cache_for(store: Arc<MemoryBillStore>) -> DueDateCache<MemoryBillStore> {
        DueDateCache::new(
            store,
            DueDateProjector::default(),
            Arc::new(FixedClock::new(date(2025, 3, 15))),
        )
    }

    #[test]
    fn starts_loading() {
        let cache = cache_for(Arc::new(MemoryBillStore::new()));
        assert_eq!(*cache.state(), CacheState::Loading);
        assert_eq!(cache.fetch_against(uuid::Uuid::new_v4()), None);
    }

    #[test]
    fn readers_keep_their_snapshot() {
        let bill = Bill::new("Rent", 900.0, date(2025, 1, 1), PeriodUnit::Monthly);
        let store = Arc::new(MemoryBillStore::with_bills([bill.clone()]));
        let cache = cache_for(Arc::clone(&store));
        cache.reset().unwrap();

        let before = cache.state();
        store.delete(bill.id).unwrap();
        cache.apply_change(&BillChange::deleted(bill.id));

        assert_eq!(before.get(bill.id), Some(DueDateInfo::DueOn(date(2025, 4, 1))));
        assert_eq!(cache.fetch_against(bill.id), None);
    }

    #[test]
    fn subscribers_see_each_transition() {
        let cache = cache_for(Arc::new(MemoryBillStore::new()));
        let rx = cache.subscribe();
        cache.reset().unwrap();
        cache.invalidate();
        let states: Vec<_> = rx.try_iter().collect();
        assert_eq!(states.len(), 2);
        assert!(states[0].is_loaded());
        assert_eq!(*states[1], CacheState::Loading);
    }
}
