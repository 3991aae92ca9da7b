//! Margin-loan amortization.
//!
//! Repayments in the source sheet carry no loan reference, so which loans a
//! repayment reduces is a policy decision rather than a fact in the data.
//! [`AllocationPolicy::PerLoanIndependent`] reproduces the source system:
//! every loan independently consumes every repayment dated after its start,
//! so one repayment can reduce several loans at once.
//! [`AllocationPolicy::GlobalSingleUse`] spends each repayment exactly once,
//! oldest open loan first.

use super::classify::{MarginLoan, RepaymentEvent};
use super::dates;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How the shared, unlabeled repayment pool is applied across loans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationPolicy {
    #[default]
    PerLoanIndependent,
    GlobalSingleUse,
}

/// Accrues amortized interest across all margin loans up to the as-of
/// instant. Interest accrues on the outstanding balance of each sub-period
/// between repayment events; a repayment may not drive a balance negative
/// and any excess is not carried forward under the per-loan policy.
pub fn accrue(
    loans: &[MarginLoan],
    repayments: &[RepaymentEvent],
    as_of: DateTime<Utc>,
    annual_rate: f64,
    policy: AllocationPolicy,
) -> f64 {
    match policy {
        AllocationPolicy::PerLoanIndependent => {
            accrue_per_loan(loans, repayments, as_of, annual_rate)
        }
        AllocationPolicy::GlobalSingleUse => accrue_global(loans, repayments, as_of, annual_rate),
    }
}

fn period_interest(outstanding: f64, days: i64, annual_rate: f64) -> f64 {
    outstanding * annual_rate * (days as f64 / 365.0)
}

fn accrue_per_loan(
    loans: &[MarginLoan],
    repayments: &[RepaymentEvent],
    as_of: DateTime<Utc>,
    annual_rate: f64,
) -> f64 {
    let mut total = 0.0;

    for loan in loans {
        let mut outstanding = loan.principal;
        let mut cursor = loan.start;

        let mut candidates: Vec<&RepaymentEvent> = repayments
            .iter()
            .filter(|repayment| repayment.date > loan.start)
            .collect();
        candidates.sort_by_key(|repayment| repayment.date);

        for repayment in candidates {
            if outstanding <= 0.0 {
                break;
            }
            let days = dates::days_between(cursor, repayment.date);
            total += period_interest(outstanding, days, annual_rate);
            outstanding = (outstanding - repayment.amount).max(0.0);
            cursor = repayment.date;
        }

        if outstanding > 0.0 {
            let days = dates::days_until(cursor, as_of);
            total += period_interest(outstanding, days, annual_rate);
        }
    }

    total
}

struct OpenLoan {
    start: NaiveDate,
    cursor: NaiveDate,
    outstanding: f64,
}

fn accrue_global(
    loans: &[MarginLoan],
    repayments: &[RepaymentEvent],
    as_of: DateTime<Utc>,
    annual_rate: f64,
) -> f64 {
    let mut open: Vec<OpenLoan> = loans
        .iter()
        .map(|loan| OpenLoan {
            start: loan.start,
            cursor: loan.start,
            outstanding: loan.principal,
        })
        .collect();
    open.sort_by_key(|loan| loan.start);

    let mut ordered: Vec<&RepaymentEvent> = repayments.iter().collect();
    ordered.sort_by_key(|repayment| repayment.date);

    let mut total = 0.0;
    for repayment in ordered {
        let mut remaining = repayment.amount;
        for loan in open.iter_mut() {
            if remaining <= 0.0 {
                break;
            }
            if loan.outstanding <= 0.0 || loan.start >= repayment.date {
                continue;
            }
            let days = dates::days_between(loan.cursor, repayment.date);
            total += period_interest(loan.outstanding, days, annual_rate);
            let applied = remaining.min(loan.outstanding);
            loan.outstanding -= applied;
            remaining -= applied;
            loan.cursor = repayment.date;
        }
    }

    for loan in &open {
        if loan.outstanding > 0.0 {
            let days = dates::days_until(loan.cursor, as_of);
            total += period_interest(loan.outstanding, days, annual_rate);
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const RATE: f64 = 0.14;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::parse_from_str("2024-07-01", "%Y-%m-%d").unwrap() + Duration::days(offset)
    }

    fn as_of_day(offset: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&day(offset).and_hms_opt(0, 0, 0).unwrap())
    }

    fn loan(principal: f64, start_offset: i64) -> MarginLoan {
        MarginLoan {
            principal,
            start: day(start_offset),
        }
    }

    fn repayment(amount: f64, date_offset: i64) -> RepaymentEvent {
        RepaymentEvent {
            amount,
            date: day(date_offset),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_loan_without_repayments_accrues_simple_interest() {
        for policy in [
            AllocationPolicy::PerLoanIndependent,
            AllocationPolicy::GlobalSingleUse,
        ] {
            let interest = accrue(&[loan(10000.0, 0)], &[], as_of_day(365), RATE, policy);
            assert_close(interest, 1400.0);
        }
    }

    #[test]
    fn test_partial_repayment_splits_accrual_periods() {
        let interest = accrue(
            &[loan(10000.0, 0)],
            &[repayment(5000.0, 182)],
            as_of_day(365),
            RATE,
            AllocationPolicy::PerLoanIndependent,
        );
        let expected = 10000.0 * RATE * 182.0 / 365.0 + 5000.0 * RATE * 183.0 / 365.0;
        assert_close(interest, expected);
    }

    #[test]
    fn test_overpayment_clamps_to_zero_and_stops_accrual() {
        let interest = accrue(
            &[loan(10000.0, 0)],
            &[repayment(15000.0, 100), repayment(5000.0, 200)],
            as_of_day(365),
            RATE,
            AllocationPolicy::PerLoanIndependent,
        );
        // only the first 100 days bill; the excess is not carried forward
        assert_close(interest, 10000.0 * RATE * 100.0 / 365.0);
    }

    #[test]
    fn test_repayments_apply_in_date_order_regardless_of_row_order() {
        let out_of_order = [repayment(5000.0, 200), repayment(5000.0, 100)];
        let interest = accrue(
            &[loan(10000.0, 0)],
            &out_of_order,
            as_of_day(365),
            RATE,
            AllocationPolicy::PerLoanIndependent,
        );
        let expected = 10000.0 * RATE * 100.0 / 365.0
            + 5000.0 * RATE * 100.0 / 365.0;
        assert_close(interest, expected);
    }

    #[test]
    fn test_repayment_on_or_before_start_is_ignored() {
        let interest = accrue(
            &[loan(10000.0, 100)],
            &[repayment(10000.0, 100), repayment(10000.0, 50)],
            as_of_day(465),
            RATE,
            AllocationPolicy::PerLoanIndependent,
        );
        assert_close(interest, 1400.0);
    }

    #[test]
    fn test_zero_amount_repayment_only_splits_the_period() {
        let split = accrue(
            &[loan(10000.0, 0)],
            &[repayment(0.0, 100)],
            as_of_day(365),
            RATE,
            AllocationPolicy::PerLoanIndependent,
        );
        // 100 + 265 elapsed days add back up to a full year
        assert_close(split, 1400.0);
    }

    #[test]
    fn test_same_day_repayments_bill_the_one_day_floor() {
        let interest = accrue(
            &[loan(10000.0, 0)],
            &[repayment(0.0, 100), repayment(0.0, 100)],
            as_of_day(365),
            RATE,
            AllocationPolicy::PerLoanIndependent,
        );
        // the second event lands on the cursor and still bills one day
        assert_close(interest, 10000.0 * RATE * 366.0 / 365.0);
    }

    #[test]
    fn test_per_loan_policy_double_counts_a_shared_repayment() {
        let loans = [loan(10000.0, 0), loan(10000.0, 10)];
        let repayments = [repayment(10000.0, 100)];
        let interest = accrue(
            &loans,
            &repayments,
            as_of_day(200),
            RATE,
            AllocationPolicy::PerLoanIndependent,
        );
        // both loans consume the same repayment and close at day 100
        let expected = 10000.0 * RATE * 100.0 / 365.0 + 10000.0 * RATE * 90.0 / 365.0;
        assert_close(interest, expected);
    }

    #[test]
    fn test_global_policy_spends_each_repayment_once_oldest_first() {
        let loans = [loan(10000.0, 0), loan(10000.0, 10)];
        let repayments = [repayment(10000.0, 100)];
        let interest = accrue(
            &loans,
            &repayments,
            as_of_day(200),
            RATE,
            AllocationPolicy::GlobalSingleUse,
        );
        // the repayment closes the oldest loan; the second stays open to as-of
        let expected = 10000.0 * RATE * 100.0 / 365.0 + 10000.0 * RATE * 190.0 / 365.0;
        assert_close(interest, expected);
    }

    #[test]
    fn test_global_policy_cascades_excess_to_the_next_loan() {
        let loans = [loan(6000.0, 0), loan(6000.0, 10)];
        let repayments = [repayment(10000.0, 100)];
        let interest = accrue(
            &loans,
            &repayments,
            as_of_day(200),
            RATE,
            AllocationPolicy::GlobalSingleUse,
        );
        let expected = 6000.0 * RATE * 100.0 / 365.0
            + 6000.0 * RATE * 90.0 / 365.0
            + 2000.0 * RATE * 100.0 / 365.0;
        assert_close(interest, expected);
    }

    #[test]
    fn test_no_loans_accrues_nothing() {
        let interest = accrue(
            &[],
            &[repayment(5000.0, 10)],
            as_of_day(100),
            RATE,
            AllocationPolicy::PerLoanIndependent,
        );
        assert_close(interest, 0.0);
    }
}
