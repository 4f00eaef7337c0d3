use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::period::PeriodUnit;

pub type BillId = Uuid;

/// A recurring obligation together with the payments recorded against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bill {
    pub id: BillId,
    pub name: String,
    pub amount: f64,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub period: PeriodUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Bill {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        start_date: NaiveDate,
        period: PeriodUnit,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount,
            start_date,
            end_date: None,
            period,
            category: None,
            notes: None,
            payments: Vec::new(),
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Records a payment and returns its identifier.
    pub fn record_payment(&mut self, paid_on: NaiveDate, amount: f64) -> Uuid {
        let payment = Payment::new(paid_on, amount);
        let id = payment.id;
        self.payments.push(payment);
        id
    }

    pub fn total_paid(&self) -> f64 {
        self.payments.iter().map(|payment| payment.amount).sum()
    }

    /// Case-insensitive match on the bill name, or an exact match on its id.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim();
        self.name.eq_ignore_ascii_case(needle) || self.id.to_string() == needle
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub paid_on: NaiveDate,
    pub amount: f64,
}

impl Payment {
    pub fn new(paid_on: NaiveDate, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            paid_on,
            amount,
        }
    }
}
