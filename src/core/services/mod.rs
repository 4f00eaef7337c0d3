pub mod due_date_service;

pub use due_date_service::{
    next_due_date, DueDateInfo, DueDateProjector, DueStatus, DEFAULT_MAX_ITERATIONS,
};
