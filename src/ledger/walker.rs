//! Lazy generation of the occurrence dates of a recurring obligation.

use std::iter::FusedIterator;

use chrono::NaiveDate;

use super::period::PeriodUnit;
use super::time_interval::{Calendar, TimeInterval};
use crate::errors::ScheduleError;

/// Steps through the occurrences of a recurrence, one date per call.
///
/// The first call to [`PeriodWalker::step`] yields `start`; every later call
/// yields the next occurrence. Once a candidate passes `end` the walker is
/// exhausted for good; build a new walker to walk again.
#[derive(Debug, Clone)]
pub struct PeriodWalker {
    start: NaiveDate,
    end: Option<NaiveDate>,
    interval: TimeInterval,
    calendar: Calendar,
    index: u32,
    exhausted: bool,
}

impl PeriodWalker {
    pub fn new(
        start: NaiveDate,
        end: Option<NaiveDate>,
        period: &PeriodUnit,
        calendar: Calendar,
    ) -> Result<Self, ScheduleError> {
        let interval = period.validated_interval()?;
        Ok(Self {
            start,
            end,
            interval,
            calendar,
            index: 0,
            exhausted: false,
        })
    }

    /// Returns the next occurrence, or `None` once the walker is exhausted.
    pub fn step(&mut self) -> Option<NaiveDate> {
        if self.exhausted {
            return None;
        }
        let candidate = self
            .calendar
            .advance(self.start, &self.interval, self.index)
            .filter(|date| self.end.map_or(true, |end| *date <= end));
        match candidate {
            Some(date) => {
                match self.index.checked_add(1) {
                    Some(next) => self.index = next,
                    None => self.exhausted = true,
                }
                Some(date)
            }
            None => {
                self.exhausted = true;
                None
            }
        }
    }

    /// Number of occurrences produced so far.
    pub fn produced(&self) -> u32 {
        self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl Iterator for PeriodWalker {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        self.step()
    }
}

impl FusedIterator for PeriodWalker {}
