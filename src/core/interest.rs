//! Simple interest on outstanding cash loans.

use super::classify::CashLoanEvent;
use super::dates;
use chrono::{DateTime, Utc};

/// Accrues simple interest on each cash loan from its date to the as-of
/// instant. Every event is an independent, fully outstanding loan; cash
/// loans have no repayment mechanism of their own.
pub fn accrue(events: &[CashLoanEvent], as_of: DateTime<Utc>, annual_rate: f64) -> f64 {
    events
        .iter()
        .map(|event| {
            let days = dates::days_until(event.date, as_of) as f64;
            event.principal * annual_rate * (days / 365.0)
        })
        .sum()
}
