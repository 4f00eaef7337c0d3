//! Bill domain models, recurrence arithmetic, and occurrence walking.

pub mod bill;
pub mod payments;
pub mod period;
pub mod time_interval;
pub mod walker;

pub use bill::{Bill, BillId, Payment};
pub use payments::{next_unpaid, payment_ledger, LedgerEntry};
pub use period::PeriodUnit;
pub use time_interval::{Calendar, MonthEndPolicy, TimeInterval, TimeUnit};
pub use walker::PeriodWalker;
