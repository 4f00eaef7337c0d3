use std::{
    fs,
    path::{Path, PathBuf},
    sync::{mpsc::Receiver, Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::{
    errors::StoreError,
    ledger::{Bill, BillId},
    utils::{ensure_dir, write_atomic},
};

use super::{BillChange, BillStore, ChangeFeed, Result};

pub const BILL_FILE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BillFile {
    schema_version: u32,
    #[serde(default)]
    bills: Vec<Bill>,
}

impl Default for BillFile {
    fn default() -> Self {
        Self {
            schema_version: BILL_FILE_SCHEMA_VERSION,
            bills: Vec::new(),
        }
    }
}

/// Bill store persisted as a single JSON document.
///
/// Every read goes to disk, so edits made by another process are visible on
/// the next fetch. Writes are staged to a temporary file and renamed into place.
#[derive(Debug)]
pub struct JsonBillStore {
    path: PathBuf,
    write_guard: Mutex<()>,
    feed: ChangeFeed,
}

impl JsonBillStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        Ok(Self {
            path,
            write_guard: Mutex::new(()),
            feed: ChangeFeed::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn insert(&self, bill: Bill) -> Result<BillId> {
        let id = bill.id;
        let change = self.modify(|bills| {
            if let Some(slot) = bills.iter_mut().find(|existing| existing.id == id) {
                *slot = bill;
                Ok(BillChange::updated(id))
            } else {
                bills.push(bill);
                Ok(BillChange::inserted(id))
            }
        })?;
        self.feed.publish(change);
        Ok(id)
    }

    pub fn update(&self, bill: Bill) -> Result<()> {
        let id = bill.id;
        let change = self.modify(|bills| {
            let slot = bills
                .iter_mut()
                .find(|existing| existing.id == id)
                .ok_or(StoreError::NotFound(id))?;
            *slot = bill;
            Ok(BillChange::updated(id))
        })?;
        self.feed.publish(change);
        Ok(())
    }

    pub fn delete(&self, id: BillId) -> Result<Bill> {
        let mut removed = None;
        let change = self.modify(|bills| {
            let index = bills
                .iter()
                .position(|existing| existing.id == id)
                .ok_or(StoreError::NotFound(id))?;
            removed = Some(bills.remove(index));
            Ok(BillChange::deleted(id))
        })?;
        self.feed.publish(change);
        removed.ok_or(StoreError::NotFound(id))
    }

    fn modify<F>(&self, mutator: F) -> Result<BillChange>
    where
        F: FnOnce(&mut Vec<Bill>) -> Result<BillChange>,
    {
        let _guard = self.write_guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.read_file()?;
        let change = mutator(&mut file.bills)?;
        save_bills_to_path(&file.bills, &self.path)?;
        Ok(change)
    }

    fn read_file(&self) -> Result<BillFile> {
        if !self.path.exists() {
            return Ok(BillFile::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let file: BillFile = serde_json::from_str(&data)?;
        if file.schema_version > BILL_FILE_SCHEMA_VERSION {
            return Err(StoreError::Unavailable(format!(
                "`{}` uses schema version {} (supported: {})",
                self.path.display(),
                file.schema_version,
                BILL_FILE_SCHEMA_VERSION
            )));
        }
        Ok(file)
    }
}

impl BillStore for JsonBillStore {
    fn fetch_all(&self) -> Result<Vec<Bill>> {
        Ok(self.read_file()?.bills)
    }

    fn fetch_by_id(&self, id: BillId) -> Result<Option<Bill>> {
        Ok(self
            .read_file()?
            .bills
            .into_iter()
            .find(|bill| bill.id == id))
    }

    fn subscribe(&self) -> Receiver<BillChange> {
        self.feed.subscribe()
    }
}

pub fn save_bills_to_path(bills: &[Bill], path: &Path) -> Result<()> {
    let file = BillFile {
        schema_version: BILL_FILE_SCHEMA_VERSION,
        bills: bills.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    write_atomic(path, &json)?;
    Ok(())
}
