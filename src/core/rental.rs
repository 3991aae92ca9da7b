//! Pro-rated warehouse rental accrual.

use super::classify::WarehouseEntry;
use super::dates;
use chrono::{DateTime, Utc};

/// Accrues storage rental for every entry up to the as-of instant. The
/// monthly rate is charged per metric ton per 30-day period, pro-rated
/// linearly by elapsed days rather than stepped in monthly increments.
pub fn accrue(entries: &[WarehouseEntry], as_of: DateTime<Utc>, monthly_rate_per_ton: f64) -> f64 {
    entries
        .iter()
        .map(|entry| {
            let tons = entry.quantity_kg / 1000.0;
            let days = dates::days_until(entry.date, as_of) as f64;
            tons * monthly_rate_per_ton * (days / 30.0)
        })
        .sum()
}
