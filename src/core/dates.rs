//! Tolerant date handling for ledger cells.
//!
//! The backing sheet mixes `2025-06-14`, `06/14/2025` and `6/14/25` style
//! entries, sometimes within a single column. Slash dates are resolved as
//! month/day/year first and fall back to day/month/year only when the first
//! reading is not a valid calendar date, so `01/02/25` reads as January 2.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Parses a ledger date cell. Returns `None` when no interpretation yields a
/// valid calendar date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let year = normalize_year(parts[2])?;
    let first = parts[0].trim().parse::<u32>().ok()?;
    let second = parts[1].trim().parse::<u32>().ok()?;

    NaiveDate::from_ymd_opt(year, first, second)
        .or_else(|| NaiveDate::from_ymd_opt(year, second, first))
}

/// Two-digit years are read as 2000+yy.
fn normalize_year(text: &str) -> Option<i32> {
    let trimmed = text.trim();
    let year = trimmed.parse::<i32>().ok()?;
    match trimmed.len() {
        2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}

/// Whole days between two ledger dates, floored at one so that same-day
/// events still bill a minimum period.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days().max(1)
}

/// Whole days from a ledger date to the as-of instant, partial days rounded
/// up, floored at one. Future-dated entries also bill the one-day minimum.
pub fn days_until(from: NaiveDate, as_of: DateTime<Utc>) -> i64 {
    let start = from.and_time(NaiveTime::MIN).and_utc();
    let seconds = (as_of - start).num_seconds();
    ((seconds + 86_399) / 86_400).max(1)
}

/// Reformats a date cell as `DD/MM/YYYY` for display; cells that do not parse
/// are passed through untouched.
pub fn format_dd_mm_yyyy(text: &str) -> String {
    match parse_date(text) {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_equivalent_spellings_normalize_to_same_date() {
        let expected = Some(date(2025, 6, 14));
        assert_eq!(parse_date("2025-06-14"), expected);
        assert_eq!(parse_date("06/14/2025"), expected);
        assert_eq!(parse_date("6/14/25"), expected);
        // 14 cannot be a month, so the day/month/year fallback kicks in
        assert_eq!(parse_date("14/06/2025"), expected);
    }

    #[test]
    fn test_ambiguous_slash_date_prefers_month_day_year() {
        assert_eq!(parse_date("01/02/25"), Some(date(2025, 1, 2)));
    }

    #[test]
    fn test_two_digit_year_is_2000_based() {
        assert_eq!(parse_date("6/14/25"), Some(date(2025, 6, 14)));
        assert_eq!(parse_date("1/1/99"), Some(date(2099, 1, 1)));
    }

    #[test]
    fn test_unparseable_inputs() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("pending"), None);
        assert_eq!(parse_date("14/14/2025"), None);
        assert_eq!(parse_date("1/2"), None);
        assert_eq!(parse_date("1/2/20255"), None);
    }

    #[test]
    fn test_days_between_floors_at_one() {
        let d = date(2025, 6, 14);
        assert_eq!(days_between(d, d), 1);
        assert_eq!(days_between(d, date(2025, 6, 15)), 1);
        assert_eq!(days_between(d, date(2025, 7, 14)), 30);
        // future-dated still bills one day
        assert_eq!(days_between(d, date(2025, 6, 1)), 1);
    }

    #[test]
    fn test_days_until_rounds_partial_days_up() {
        let entry = date(2025, 6, 14);
        let midnight = Utc.with_ymd_and_hms(2025, 7, 14, 0, 0, 0).unwrap();
        assert_eq!(days_until(entry, midnight), 30);

        // any time-of-day past midnight counts as a full extra day
        let midday = Utc.with_ymd_and_hms(2025, 7, 14, 12, 30, 0).unwrap();
        assert_eq!(days_until(entry, midday), 31);

        let same_day = Utc.with_ymd_and_hms(2025, 6, 14, 0, 0, 0).unwrap();
        assert_eq!(days_until(entry, same_day), 1);
    }

    #[test]
    fn test_days_until_is_monotonic() {
        let entry = date(2025, 1, 1);
        let mut previous = 0;
        for offset in 0..40 {
            let as_of = Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap()
                + chrono::Duration::days(offset);
            let days = days_until(entry, as_of);
            assert!(days >= previous);
            previous = days;
        }
    }

    #[test]
    fn test_format_dd_mm_yyyy() {
        assert_eq!(format_dd_mm_yyyy("6/14/25"), "14/06/2025");
        assert_eq!(format_dd_mm_yyyy("2025-01-02"), "02/01/2025");
        assert_eq!(format_dd_mm_yyyy("pending"), "pending");
        assert_eq!(format_dd_mm_yyyy(""), "");
    }
}
