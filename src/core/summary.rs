//! Aggregate summarizer and engine entry point.
//!
//! The engine is a pure transform: a row-set snapshot plus an as-of instant
//! in, one summary value out. Nothing here reads a clock or mutates shared
//! state, so the same inputs always produce the same summary.

use super::classify;
use super::margin::AllocationPolicy;
use super::row::{RowSchema, SellerSchema, TransactionRow};
use super::{interest, margin, rental};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Accrual rates applied by the calculators.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct AccrualRates {
    /// Simple annual interest on cash and margin loans.
    pub annual_interest: f64,
    /// Warehouse rental per metric ton per 30-day period.
    pub rental_per_ton_per_month: f64,
}

impl Default for AccrualRates {
    fn default() -> Self {
        AccrualRates {
            annual_interest: 0.14,
            rental_per_ton_per_month: 100.0,
        }
    }
}

/// Computed position of one stockist ledger as of a given instant. Plain
/// numbers and strings only, suitable for direct serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StockistSummary {
    pub total_quantity: f64,
    pub quantity_by_commodity: BTreeMap<String, f64>,
    pub total_cost: f64,
    pub total_cash_loan: f64,
    /// Originations minus repayments over the whole row-set, not
    /// interest-adjusted.
    pub net_margin_loan_balance: f64,
    /// Sum of the pre-aggregated loan column, read as-is.
    pub total_loan: f64,
    pub warehouse_rental: f64,
    pub total_interest: f64,
}

/// Computed position of one seller across the seller tabs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SellerSummary {
    pub entry_count: usize,
    pub total_quantity: f64,
    pub total_payments: f64,
}

/// The ledger accrual engine. Holds the schema revision, rates and the
/// repayment allocation policy; see [`AllocationPolicy`] for the latter.
pub struct LedgerEngine {
    schema: RowSchema,
    rates: AccrualRates,
    policy: AllocationPolicy,
}

impl LedgerEngine {
    pub fn new(schema: RowSchema, rates: AccrualRates, policy: AllocationPolicy) -> Self {
        LedgerEngine {
            schema,
            rates,
            policy,
        }
    }

    /// Computes the full stockist summary for a row-set snapshot. An empty
    /// row-set is valid input and yields an all-zero summary.
    pub fn summarize(&self, raw_rows: &[Vec<String>], as_of: DateTime<Utc>) -> StockistSummary {
        let rows: Vec<TransactionRow> = raw_rows
            .iter()
            .map(|raw| TransactionRow::project(raw, &self.schema))
            .collect();
        let classified = classify::classify(&rows);
        debug!(
            rows = rows.len(),
            warehouse = classified.warehouse_entries.len(),
            cash_loans = classified.cash_loans.len(),
            margin_loans = classified.margin_loans.len(),
            repayments = classified.repayments.len(),
            "Classified ledger rows"
        );

        let warehouse_rental = rental::accrue(
            &classified.warehouse_entries,
            as_of,
            self.rates.rental_per_ton_per_month,
        );
        let cash_interest =
            interest::accrue(&classified.cash_loans, as_of, self.rates.annual_interest);
        let margin_interest = margin::accrue(
            &classified.margin_loans,
            &classified.repayments,
            as_of,
            self.rates.annual_interest,
            self.policy,
        );

        let mut summary = StockistSummary {
            warehouse_rental,
            total_interest: cash_interest + margin_interest,
            ..StockistSummary::default()
        };

        for row in &rows {
            if let Some(quantity) = row.quantity {
                summary.total_quantity += quantity;
                if let Some(commodity) = &row.commodity {
                    *summary
                        .quantity_by_commodity
                        .entry(commodity.to_lowercase())
                        .or_default() += quantity;
                }
            }
            summary.total_cost += row.cost.unwrap_or(0.0);
            summary.total_cash_loan += row.cash_loan_amount.unwrap_or(0.0);
            summary.net_margin_loan_balance +=
                row.margin_principal.unwrap_or(0.0) - row.repayment_amount.unwrap_or(0.0);
            summary.total_loan += row.total_loan.unwrap_or(0.0);
        }

        summary
    }
}

/// Reduces already-filtered seller rows to the seller position. Missing and
/// non-numeric cells contribute zero.
pub fn summarize_seller(raw_rows: &[Vec<String>], schema: &SellerSchema) -> SellerSummary {
    let mut summary = SellerSummary {
        entry_count: raw_rows.len(),
        ..SellerSummary::default()
    };
    for raw in raw_rows {
        summary.total_quantity += numeric_cell(raw, schema.quantity);
        summary.total_payments += numeric_cell(raw, schema.payment);
    }
    summary
}

fn numeric_cell(raw: &[String], index: usize) -> f64 {
    raw.get(index)
        .and_then(|text| super::numeric::parse_decimal(text))
        .unwrap_or(0.0)
}
