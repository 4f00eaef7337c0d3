//! Explicit lifecycle for a store plus its due-date cache.

use std::sync::{mpsc::Receiver, Arc};

use crate::{
    core::{due_date_cache::DueDateCache, services::DueDateProjector, time::Clock},
    errors::ScheduleError,
    storage::{BillChange, BillStore},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub applied: usize,
    pub reloaded: bool,
}

/// Owns the store handle, the cache, and the store's change feed.
///
/// The session is the single writer of its cache: change notifications are
/// only folded in when the owner calls [`BillSession::sync`]. Readers take a
/// cache handle from [`BillSession::cache`] and may live on other threads.
pub struct BillSession<S: BillStore + ?Sized> {
    store: Arc<S>,
    cache: Arc<DueDateCache<S>>,
    changes: Receiver<BillChange>,
}

impl<S: BillStore + ?Sized> BillSession<S> {
    /// Subscribes to the store and performs the initial load.
    ///
    /// A failed initial load leaves the cache in its error state; the next
    /// [`BillSession::sync`] retries it.
    pub fn open(store: Arc<S>, projector: DueDateProjector, clock: Arc<dyn Clock>) -> Self {
        let changes = store.subscribe();
        let cache = Arc::new(DueDateCache::new(Arc::clone(&store), projector, clock));
        match cache.reset() {
            Ok(entries) => tracing::info!(entries, "bill session opened"),
            Err(err) => tracing::warn!("bill session opened without due dates: {err}"),
        }
        Self {
            store,
            cache,
            changes,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> Arc<DueDateCache<S>> {
        Arc::clone(&self.cache)
    }

    /// Drains pending store changes into the cache.
    ///
    /// When the cache is not loaded the pending changes are discarded and a
    /// full reset runs instead.
    pub fn sync(&self) -> Result<SyncReport, ScheduleError> {
        let pending: Vec<BillChange> = self.changes.try_iter().collect();
        if !self.cache.state().is_loaded() {
            self.cache.reset()?;
            return Ok(SyncReport {
                applied: 0,
                reloaded: true,
            });
        }
        let mut report = SyncReport::default();
        for change in &pending {
            self.cache.apply_change(change);
            report.applied += 1;
        }
        Ok(report)
    }

    /// Ends the session and returns the cache to its loading state.
    pub fn close(self) {
        self.cache.invalidate();
        tracing::info!("bill session closed");
    }
}
