use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeUnit::Day => "Day",
            TimeUnit::Week => "Week",
            TimeUnit::Month => "Month",
            TimeUnit::Year => "Year",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    pub every: u32,
    pub unit: TimeUnit,
}

impl TimeInterval {
    pub const fn new(every: u32, unit: TimeUnit) -> Self {
        Self { every, unit }
    }

    /// An interval that never moves a date forward.
    pub fn is_zero(&self) -> bool {
        self.every == 0
    }

    pub fn label(&self) -> String {
        match (self.every, self.unit) {
            (1, TimeUnit::Day) => "Daily".into(),
            (1, TimeUnit::Week) => "Weekly".into(),
            (2, TimeUnit::Week) => "Biweekly".into(),
            (1, TimeUnit::Month) => "Monthly".into(),
            (3, TimeUnit::Month) => "Quarterly".into(),
            (1, TimeUnit::Year) => "Yearly".into(),
            (n, unit) => format!("Every {} {}{}", n, unit, if n == 1 { "" } else { "s" }),
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// How month and year arithmetic resolves a day that does not exist in the
/// target month (e.g. the 31st landing in February).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MonthEndPolicy {
    /// Use the last day of the target month.
    #[default]
    Clamp,
    /// Use the first day of the month after the target month.
    RollOver,
}

/// Calendar-aware date arithmetic.
///
/// Occurrences are computed from an anchor date, so a bill anchored on the
/// 31st keeps returning to the 31st in long months instead of drifting to the
/// shortest day it was ever clamped to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Calendar {
    #[serde(default)]
    pub month_end: MonthEndPolicy,
}

impl Calendar {
    pub const fn new(month_end: MonthEndPolicy) -> Self {
        Self { month_end }
    }

    /// Returns `anchor` advanced by `steps` whole intervals, or `None` when the
    /// result is outside the representable date range.
    pub fn advance(
        &self,
        anchor: NaiveDate,
        interval: &TimeInterval,
        steps: u32,
    ) -> Option<NaiveDate> {
        let count = u64::from(interval.every) * u64::from(steps);
        match interval.unit {
            TimeUnit::Day => anchor.checked_add_days(Days::new(count)),
            TimeUnit::Week => anchor.checked_add_days(Days::new(count.checked_mul(7)?)),
            TimeUnit::Month => self.shift_months(anchor, i64::try_from(count).ok()?),
            TimeUnit::Year => {
                let months = i64::try_from(count).ok()?.checked_mul(12)?;
                self.shift_months(anchor, months)
            }
        }
    }

    fn shift_months(&self, date: NaiveDate, months: i64) -> Option<NaiveDate> {
        let index = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
        let (year, month) = split_month_index(index)?;
        let day = date.day();
        let last = days_in_month(year, month)?;
        if day <= last {
            return NaiveDate::from_ymd_opt(year, month, day);
        }
        match self.month_end {
            MonthEndPolicy::Clamp => NaiveDate::from_ymd_opt(year, month, last),
            MonthEndPolicy::RollOver => {
                let (year, month) = split_month_index(index + 1)?;
                NaiveDate::from_ymd_opt(year, month, 1)
            }
        }
    }
}

fn split_month_index(index: i64) -> Option<(i32, u32)> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;
    Some((year, month))
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    if month == 12 {
        return Some(31);
    }
    let first_next = NaiveDate::from_ymd_opt(year, month + 1, 1)?;
    first_next.pred_opt().map(|last| last.day())
}
