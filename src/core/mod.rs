pub mod due_date_cache;
pub mod services;
pub mod session;
pub mod time;

pub use due_date_cache::{CacheState, ChangeOutcome, DueDateCache, DueDateMap};
pub use session::{BillSession, SyncReport};
pub use time::{Clock, FixedClock, SystemClock};
