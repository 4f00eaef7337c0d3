pub mod json_backend;
pub mod memory;

use std::sync::{
    mpsc::{self, Receiver, Sender},
    Mutex, PoisonError,
};

use crate::{
    errors::StoreError,
    ledger::{Bill, BillId},
};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Read access to a collection of bills plus a feed of committed changes.
pub trait BillStore: Send + Sync {
    fn fetch_all(&self) -> Result<Vec<Bill>>;
    fn fetch_by_id(&self, id: BillId) -> Result<Option<Bill>>;

    /// Returns a receiver that gets one [`BillChange`] per committed mutation.
    fn subscribe(&self) -> Receiver<BillChange>;
}

/// Identifiers touched by one commit of the bill store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillChange {
    pub inserted: Vec<BillId>,
    pub updated: Vec<BillId>,
    pub deleted: Vec<BillId>,
}

impl BillChange {
    pub fn inserted(id: BillId) -> Self {
        Self {
            inserted: vec![id],
            ..Self::default()
        }
    }

    pub fn updated(id: BillId) -> Self {
        Self {
            updated: vec![id],
            ..Self::default()
        }
    }

    pub fn deleted(id: BillId) -> Self {
        Self {
            deleted: vec![id],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Ids whose due date must be recomputed.
    pub fn touched(&self) -> impl Iterator<Item = &BillId> {
        self.inserted.iter().chain(self.updated.iter())
    }
}

/// Fan-out of [`BillChange`] notifications to any number of subscribers.
#[derive(Debug, Default)]
pub struct ChangeFeed {
    subscribers: Mutex<Vec<Sender<BillChange>>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<BillChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Sends `change` to every live subscriber, dropping disconnected ones.
    pub fn publish(&self, change: BillChange) {
        if change.is_empty() {
            return;
        }
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub use json_backend::{JsonBillStore, BILL_FILE_SCHEMA_VERSION};
pub use memory::MemoryBillStore;
