use thiserror::Error;
use uuid::Uuid;

/// Failures raised while talking to a bill store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Bill not found: {0}")]
    NotFound(Uuid),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Error type that captures scheduling and projection failures.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid period: recurrence must advance by at least one unit")]
    InvalidPeriod,
    #[error("Projection for bill {bill} exceeded {iterations} iterations")]
    Overrun { bill: Uuid, iterations: usize },
    #[error("Bill store fetch failed: {0}")]
    StoreFetchFailed(#[from] StoreError),
}
