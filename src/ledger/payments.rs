//! Pairs recorded payments with the billing periods they settle.

use chrono::NaiveDate;

use super::bill::{Bill, Payment};
use super::time_interval::Calendar;
use super::walker::PeriodWalker;
use crate::errors::ScheduleError;

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub payment: Payment,
    /// Occurrence this payment settles; `None` when the payment falls beyond
    /// the last occurrence of the bill.
    pub period_due: Option<NaiveDate>,
    pub on_time: bool,
}

/// Matches payments, oldest first, to successive occurrences of the bill.
pub fn payment_ledger(bill: &Bill, calendar: Calendar) -> Result<Vec<LedgerEntry>, ScheduleError> {
    let mut walker = PeriodWalker::new(bill.start_date, bill.end_date, &bill.period, calendar)?;
    let mut payments = bill.payments.clone();
    payments.sort_by_key(|payment| payment.paid_on);

    Ok(payments
        .into_iter()
        .map(|payment| {
            let period_due = walker.step();
            let on_time = period_due.is_some_and(|due| payment.paid_on <= due);
            LedgerEntry {
                payment,
                period_due,
                on_time,
            }
        })
        .collect())
}

/// First occurrence not yet covered by a recorded payment.
pub fn next_unpaid(bill: &Bill, calendar: Calendar) -> Result<Option<NaiveDate>, ScheduleError> {
    let mut walker = PeriodWalker::new(bill.start_date, bill.end_date, &bill.period, calendar)?;
    Ok(walker.nth(bill.payments.len()))
}
