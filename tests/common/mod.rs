#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Receiver,
};

use bill_ledger::{
    errors::StoreError,
    ledger::{Bill, BillId},
    storage::{BillChange, BillStore, MemoryBillStore},
};
use chrono::NaiveDate;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Memory store whose reads can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryBillStore,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn with_bills(bills: impl IntoIterator<Item = Bill>) -> Self {
        Self {
            inner: MemoryBillStore::with_bills(bills),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store offline".into()))
        } else {
            Ok(())
        }
    }
}

impl BillStore for FlakyStore {
    fn fetch_all(&self) -> Result<Vec<Bill>, StoreError> {
        self.check()?;
        self.inner.fetch_all()
    }

    fn fetch_by_id(&self, id: BillId) -> Result<Option<Bill>, StoreError> {
        self.check()?;
        self.inner.fetch_by_id(id)
    }

    fn subscribe(&self) -> Receiver<BillChange> {
        self.inner.subscribe()
    }
}
