//! Presence-based partition of a row-set into calculator inputs.

use super::row::TransactionRow;
use chrono::NaiveDate;

/// A dated stock entry accruing warehouse rental.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarehouseEntry {
    pub date: NaiveDate,
    pub quantity_kg: f64,
}

/// A standalone cash loan, never reduced by repayments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashLoanEvent {
    pub principal: f64,
    pub date: NaiveDate,
}

/// A margin-loan origination. Immutable once derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginLoan {
    pub principal: f64,
    pub start: NaiveDate,
}

/// A repayment, not tied to any particular loan in the source data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepaymentEvent {
    pub amount: f64,
    pub date: NaiveDate,
}

/// The four typed sub-views of one row-set. A single row may appear in
/// several of them.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedRows {
    pub warehouse_entries: Vec<WarehouseEntry>,
    pub cash_loans: Vec<CashLoanEvent>,
    pub margin_loans: Vec<MarginLoan>,
    pub repayments: Vec<RepaymentEvent>,
}

/// Partitions the row-set by which field groups are populated. A row counts
/// as a given event type only when both its amount and its date for that
/// type survived projection.
pub fn classify(rows: &[TransactionRow]) -> ClassifiedRows {
    let mut classified = ClassifiedRows::default();

    for row in rows {
        if let (Some(date), Some(quantity_kg)) = (row.date, row.quantity) {
            classified.warehouse_entries.push(WarehouseEntry { date, quantity_kg });
        }
        if let (Some(principal), Some(date)) = (row.cash_loan_amount, row.cash_loan_date) {
            classified.cash_loans.push(CashLoanEvent { principal, date });
        }
        if let (Some(principal), Some(start)) = (row.margin_principal, row.margin_date) {
            classified.margin_loans.push(MarginLoan { principal, start });
        }
        if let (Some(amount), Some(date)) = (row.repayment_amount, row.repayment_date) {
            classified.repayments.push(RepaymentEvent { amount, date });
        }
    }

    classified
}
