use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

/// Half-open `[00:00:00, next day 00:00:00)` bounds for SQL range filters.
pub fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_hms_opt(0, 0, 0).unwrap();
    (start, start + Duration::days(1))
}

/// Day-boundary timestamp used when force-ending shifts left open overnight.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59).unwrap()
}

pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Working days (Mon-Fri) in the inclusive range. Empty when end < start.
pub fn working_days_in(start: NaiveDate, end: NaiveDate) -> i64 {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_working_day(*d))
        .count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn bounds_cover_exactly_one_day() {
        let (start, end) = day_bounds(d("2026-03-10"));
        assert_eq!(start.to_string(), "2026-03-10 00:00:00");
        assert_eq!(end.to_string(), "2026-03-11 00:00:00");
    }

    #[test]
    fn weekends_are_not_working_days() {
        assert!(is_working_day(d("2026-03-09"))); // Monday
        assert!(!is_working_day(d("2026-03-14"))); // Saturday
        assert!(!is_working_day(d("2026-03-15"))); // Sunday
    }

    #[test]
    fn working_day_count_over_full_weeks() {
        // 2026-03-02 (Mon) .. 2026-03-15 (Sun) = two full weeks
        assert_eq!(working_days_in(d("2026-03-02"), d("2026-03-15")), 10);
        assert_eq!(working_days_in(d("2026-03-02"), d("2026-03-02")), 1);
        assert_eq!(working_days_in(d("2026-03-15"), d("2026-03-02")), 0);
    }

    #[test]
    fn end_of_day_is_last_second() {
        assert_eq!(end_of_day(d("2026-03-10")).to_string(), "2026-03-10 23:59:59");
    }
}
