//! Calendar helpers: weekday checks, day walking and chart labels

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Check if date is a weekend
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Check if date is a Friday
pub fn is_friday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri
}

/// Every calendar day between two dates (inclusive). Empty when `start > end`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let count = (end - start).num_days().max(-1) + 1;
    (0..count).map(move |offset| start + Duration::days(offset))
}

/// Chart label for a day: `dd/mm/yy`
pub fn day_label(date: NaiveDate) -> String {
    date.format("%d/%m/%y").to_string()
}

/// Bucket key for a month: `YYYY-MM`
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Chart label for a month: abbreviated month and 2-digit year, e.g. `Feb/23`
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b/%y").to_string()
}

/// Whole days from `from` to `to`, as fractional years of 365 days
pub fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / 365.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_weekdays() {
        // 2024-01-05 is a Friday
        assert!(is_friday(d(2024, 1, 5)));
        assert!(!is_weekend(d(2024, 1, 5)));
        assert!(is_weekend(d(2024, 1, 6)));
        assert!(is_weekend(d(2024, 1, 7)));
        assert!(!is_weekend(d(2024, 1, 8)));
    }

    #[test]
    fn test_days_inclusive() {
        let days: Vec<_> = days_inclusive(d(2024, 2, 27), d(2024, 3, 1)).collect();
        assert_eq!(days, vec![d(2024, 2, 27), d(2024, 2, 28), d(2024, 2, 29), d(2024, 3, 1)]);

        assert_eq!(days_inclusive(d(2024, 1, 1), d(2024, 1, 1)).count(), 1);
        assert_eq!(days_inclusive(d(2024, 1, 2), d(2024, 1, 1)).count(), 0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(day_label(d(2023, 1, 6)), "06/01/23");
        assert_eq!(month_key(d(2023, 2, 1)), "2023-02");
        assert_eq!(month_label(d(2023, 2, 1)), "Feb/23");
    }

    #[test]
    fn test_years_between() {
        assert_eq!(years_between(d(2020, 1, 1), d(2020, 12, 31)), 365.0 / 365.0);
        assert_eq!(years_between(d(2020, 1, 1), d(2020, 1, 1)), 0.0);
    }
}
