use std::fmt;

use serde::{Deserialize, Serialize};

use super::time_interval::{TimeInterval, TimeUnit};
use crate::errors::ScheduleError;

/// Recurrence granularity of a bill.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    Daily,
    Weekly,
    Biweekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
    Custom(TimeInterval),
}

impl PeriodUnit {
    pub fn interval(&self) -> TimeInterval {
        match self {
            PeriodUnit::Daily => TimeInterval::new(1, TimeUnit::Day),
            PeriodUnit::Weekly => TimeInterval::new(1, TimeUnit::Week),
            PeriodUnit::Biweekly => TimeInterval::new(2, TimeUnit::Week),
            PeriodUnit::Monthly => TimeInterval::new(1, TimeUnit::Month),
            PeriodUnit::Quarterly => TimeInterval::new(3, TimeUnit::Month),
            PeriodUnit::Yearly => TimeInterval::new(1, TimeUnit::Year),
            PeriodUnit::Custom(interval) => *interval,
        }
    }

    /// Returns the step interval, rejecting units that would never advance.
    pub fn validated_interval(&self) -> Result<TimeInterval, ScheduleError> {
        let interval = self.interval();
        if interval.is_zero() {
            return Err(ScheduleError::InvalidPeriod);
        }
        Ok(interval)
    }

    /// Parses the labels accepted by the CLI (`monthly`, `biweekly`, ...).
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(PeriodUnit::Daily),
            "weekly" => Some(PeriodUnit::Weekly),
            "biweekly" => Some(PeriodUnit::Biweekly),
            "monthly" => Some(PeriodUnit::Monthly),
            "quarterly" => Some(PeriodUnit::Quarterly),
            "yearly" | "annually" => Some(PeriodUnit::Yearly),
            _ => None,
        }
    }
}

impl fmt::Display for PeriodUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.interval().label())
    }
}
