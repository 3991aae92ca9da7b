//! Named-field projection of raw spreadsheet rows.
//!
//! The position of each ledger field within a row is a versioned contract
//! with the sheet; it has moved between schema revisions, so the indices are
//! configuration rather than constants. A raw row is projected into a
//! [`TransactionRow`] exactly once at this boundary and the calculators only
//! ever see named fields.

use super::{dates, numeric};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column positions of the ledger fields within one raw row.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RowSchema {
    pub date: usize,
    pub commodity: usize,
    pub quantity: usize,
    pub cost: usize,
    pub repayment_amount: usize,
    pub repayment_date: usize,
    pub cash_loan_amount: usize,
    pub cash_loan_date: usize,
    pub margin_principal: usize,
    pub margin_date: usize,
    pub total_loan: usize,
}

impl Default for RowSchema {
    /// Current sheet revision.
    fn default() -> Self {
        RowSchema {
            date: 0,
            commodity: 4,
            quantity: 5,
            cost: 6,
            repayment_amount: 8,
            repayment_date: 9,
            cash_loan_amount: 10,
            cash_loan_date: 11,
            margin_principal: 12,
            margin_date: 13,
            total_loan: 14,
        }
    }
}

/// Column positions within the seller tabs, which use their own layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SellerSchema {
    pub date: usize,
    pub name: usize,
    pub mobile: usize,
    pub quantity: usize,
    pub payment: usize,
    pub payment_date: usize,
}

impl Default for SellerSchema {
    fn default() -> Self {
        SellerSchema {
            date: 0,
            name: 1,
            mobile: 2,
            quantity: 4,
            payment: 10,
            payment_date: 11,
        }
    }
}

/// One ledger line with every field optional. `None` means the cell was blank
/// or missing; a cell that is present but not numeric coerces to `Some(0.0)`
/// so that it still counts for presence-based classification. Dates that do
/// not parse are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRow {
    pub date: Option<NaiveDate>,
    pub commodity: Option<String>,
    pub quantity: Option<f64>,
    pub cost: Option<f64>,
    pub repayment_amount: Option<f64>,
    pub repayment_date: Option<NaiveDate>,
    pub cash_loan_amount: Option<f64>,
    pub cash_loan_date: Option<NaiveDate>,
    pub margin_principal: Option<f64>,
    pub margin_date: Option<NaiveDate>,
    pub total_loan: Option<f64>,
}

impl TransactionRow {
    pub fn project(raw: &[String], schema: &RowSchema) -> Self {
        TransactionRow {
            date: date_cell(raw, schema.date),
            commodity: text_cell(raw, schema.commodity),
            quantity: amount_cell(raw, schema.quantity),
            cost: amount_cell(raw, schema.cost),
            repayment_amount: amount_cell(raw, schema.repayment_amount),
            repayment_date: date_cell(raw, schema.repayment_date),
            cash_loan_amount: amount_cell(raw, schema.cash_loan_amount),
            cash_loan_date: date_cell(raw, schema.cash_loan_date),
            margin_principal: amount_cell(raw, schema.margin_principal),
            margin_date: date_cell(raw, schema.margin_date),
            total_loan: amount_cell(raw, schema.total_loan),
        }
    }
}

fn cell(raw: &[String], index: usize) -> Option<&str> {
    raw.get(index)
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
}

fn text_cell(raw: &[String], index: usize) -> Option<String> {
    cell(raw, index).map(str::to_string)
}

fn amount_cell(raw: &[String], index: usize) -> Option<f64> {
    cell(raw, index).map(|text| numeric::parse_decimal(text).unwrap_or(0.0))
}

fn date_cell(raw: &[String], index: usize) -> Option<NaiveDate> {
    cell(raw, index).and_then(dates::parse_date)
}
