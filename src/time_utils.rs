// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for calendar days.

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};

/// Today's date on the local calendar.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a calendar day as `YYYY-MM-DD`.
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The `n` days ending at (and including) `end`, oldest first.
pub fn trailing_days(end: NaiveDate, n: u32) -> Vec<NaiveDate> {
    (0..n)
        .rev()
        .filter_map(|back| end.checked_sub_days(chrono::Days::new(u64::from(back))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_iso_date_pads() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(format_iso_date(date), "2024-01-02");
    }

    #[test]
    fn test_trailing_days_crosses_month() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let days: Vec<String> = trailing_days(end, 3).into_iter().map(format_iso_date).collect();
        assert_eq!(days, vec!["2024-02-29", "2024-03-01", "2024-03-02"]);
    }
}
