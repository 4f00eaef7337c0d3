//! Projection of bill occurrences onto the next due date.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::config::Config;
use crate::errors::ScheduleError;
use crate::ledger::{Bill, BillId, Calendar, PeriodWalker};

/// Upper bound on walker steps per bill before projection gives up.
pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;

/// Derived due-date state of a bill relative to a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "date", rename_all = "snake_case")]
pub enum DueDateInfo {
    Expired,
    DueOn(NaiveDate),
}

impl DueDateInfo {
    pub fn due_date(&self) -> Option<NaiveDate> {
        match self {
            DueDateInfo::Expired => None,
            DueDateInfo::DueOn(date) => Some(*date),
        }
    }

    pub fn status(&self, today: NaiveDate, due_soon_days: u32) -> DueStatus {
        match self {
            DueDateInfo::Expired => DueStatus::Expired,
            DueDateInfo::DueOn(date) => {
                // A window reaching past the calendar covers every date.
                let within = today
                    .checked_add_days(Days::new(u64::from(due_soon_days)))
                    .map_or(true, |cutoff| *date <= cutoff);
                if within {
                    DueStatus::DueSoon
                } else {
                    DueStatus::Upcoming
                }
            }
        }
    }
}

impl From<Option<NaiveDate>> for DueDateInfo {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map_or(DueDateInfo::Expired, DueDateInfo::DueOn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    DueSoon,
    Upcoming,
    Expired,
}

/// Walks bill schedules forward to their next occurrence on or after a reference day.
#[derive(Debug, Clone, Copy)]
pub struct DueDateProjector {
    calendar: Calendar,
    max_iterations: usize,
}

impl Default for DueDateProjector {
    fn default() -> Self {
        Self::new(Calendar::default(), DEFAULT_MAX_ITERATIONS)
    }
}

impl DueDateProjector {
    pub fn new(calendar: Calendar, max_iterations: usize) -> Self {
        Self {
            calendar,
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.calendar(), config.max_iterations)
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Returns the first occurrence on or after `now`, or `None` when every
    /// occurrence of the bill lies before `now`.
    pub fn next_due_date(
        &self,
        bill: &Bill,
        now: NaiveDate,
    ) -> Result<Option<NaiveDate>, ScheduleError> {
        let mut walker =
            PeriodWalker::new(bill.start_date, bill.end_date, &bill.period, self.calendar)?;
        for _ in 0..self.max_iterations {
            match walker.step() {
                Some(date) if date >= now => return Ok(Some(date)),
                Some(_) => continue,
                None => return Ok(None),
            }
        }
        // Reaching the cap on the last occurrence is not an overrun.
        if walker.step().is_none() {
            return Ok(None);
        }
        Err(ScheduleError::Overrun {
            bill: bill.id,
            iterations: self.max_iterations,
        })
    }

    pub fn due_date_info(&self, bill: &Bill, now: NaiveDate) -> Result<DueDateInfo, ScheduleError> {
        self.next_due_date(bill, now).map(DueDateInfo::from)
    }

    /// Projects every bill; bills that fail to project are logged and left out.
    pub fn all_due_dates(&self, bills: &[Bill], now: NaiveDate) -> HashMap<BillId, DueDateInfo> {
        let mut entries = HashMap::with_capacity(bills.len());
        for bill in bills {
            match self.due_date_info(bill, now) {
                Ok(info) => {
                    entries.insert(bill.id, info);
                }
                Err(err) => {
                    tracing::warn!(bill = %bill.id, name = %bill.name, "skipping bill: {err}");
                }
            }
        }
        entries
    }
}

/// Next due date of `bill` using the default iteration cap.
pub fn next_due_date(
    bill: &Bill,
    now: NaiveDate,
    calendar: Calendar,
) -> Result<Option<NaiveDate>, ScheduleError> {
    DueDateProjector::new(calendar, DEFAULT_MAX_ITERATIONS).next_due_date(bill, now)
}
