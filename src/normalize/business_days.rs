//! Business-day arithmetic.

use chrono::{Datelike, NaiveDate, Weekday};

/// Weekdays between `start` and `end`, counting both ends, minus one.
///
/// The start day itself is not stalled time, so a same-day span is zero.
/// A start after the end yields zero.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> u32 {
    if start > end {
        return 0;
    }

    let weekdays = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32;

    weekdays.saturating_sub(1)
}

/// Stalled days for an optional entry date.
pub fn stalled_days(entry: Option<NaiveDate>, now: NaiveDate) -> u32 {
    entry.map_or(0, |start| business_days_between(start, now))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_same_day_is_zero() {
        let monday = ymd(2024, 1, 15);
        let saturday = ymd(2024, 1, 20);
        assert_eq!(business_days_between(monday, monday), 0);
        assert_eq!(business_days_between(saturday, saturday), 0);
    }

    #[test]
    fn test_monday_to_friday() {
        assert_eq!(business_days_between(ymd(2024, 1, 15), ymd(2024, 1, 19)), 4);
    }

    #[test]
    fn test_monday_to_tuesday_counts_one() {
        assert_eq!(business_days_between(ymd(2024, 1, 15), ymd(2024, 1, 16)), 1);
    }

    #[test]
    fn test_weekend_is_skipped() {
        // Friday to next Monday: Fri + Mon = 2 weekdays, minus one.
        assert_eq!(business_days_between(ymd(2024, 1, 19), ymd(2024, 1, 22)), 1);
        // Monday to the Monday after: six weekdays, minus one.
        assert_eq!(business_days_between(ymd(2024, 1, 15), ymd(2024, 1, 22)), 5);
    }

    #[test]
    fn test_start_after_end_is_zero() {
        assert_eq!(business_days_between(ymd(2024, 2, 1), ymd(2024, 1, 1)), 0);
    }

    #[test]
    fn test_missing_entry_is_zero() {
        assert_eq!(stalled_days(None, ymd(2024, 1, 15)), 0);
        assert_eq!(stalled_days(Some(ymd(2024, 1, 15)), ymd(2024, 1, 19)), 4);
    }
}
