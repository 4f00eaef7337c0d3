#![doc(test(attr(deny(warnings))))]

//! Bill Ledger projects recurring bills onto their due dates, pairs recorded
//! payments with billing periods, and keeps a due-date cache in step with a
//! bill store.

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("Bill Ledger tracing initialized.");
    });
}
