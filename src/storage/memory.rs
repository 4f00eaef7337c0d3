use std::{
    collections::BTreeMap,
    sync::{mpsc::Receiver, PoisonError, RwLock},
};

use crate::{
    errors::StoreError,
    ledger::{Bill, BillId},
};

use super::{BillChange, BillStore, ChangeFeed, Result};

/// Bill store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryBillStore {
    bills: RwLock<BTreeMap<BillId, Bill>>,
    feed: ChangeFeed,
}

impl MemoryBillStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bills(bills: impl IntoIterator<Item = Bill>) -> Self {
        let store = Self::new();
        {
            let mut map = store.bills.write().unwrap_or_else(PoisonError::into_inner);
            for bill in bills {
                map.insert(bill.id, bill);
            }
        }
        store
    }

    pub fn insert(&self, bill: Bill) -> BillId {
        let id = bill.id;
        let replaced = self
            .bills
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, bill)
            .is_some();
        self.feed.publish(if replaced {
            BillChange::updated(id)
        } else {
            BillChange::inserted(id)
        });
        id
    }

    pub fn update(&self, bill: Bill) -> Result<()> {
        let id = bill.id;
        {
            let mut map = self.bills.write().unwrap_or_else(PoisonError::into_inner);
            let slot = map.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            *slot = bill;
        }
        self.feed.publish(BillChange::updated(id));
        Ok(())
    }

    pub fn delete(&self, id: BillId) -> Result<Bill> {
        let removed = self
            .bills
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or(StoreError::NotFound(id))?;
        self.feed.publish(BillChange::deleted(id));
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.bills.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BillStore for MemoryBillStore {
    fn fetch_all(&self) -> Result<Vec<Bill>> {
        Ok(self
            .bills
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }

    fn fetch_by_id(&self, id: BillId) -> Result<Option<Bill>> {
        Ok(self
            .bills
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }

    fn subscribe(&self) -> Receiver<BillChange> {
        self.feed.subscribe()
    }
}
