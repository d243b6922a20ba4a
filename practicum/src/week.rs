//! Practicum week computation.

use chrono::NaiveDate;

use crate::types::WeekNumber;

/// Map a calendar date to its 1-based practicum week.
///
/// The start date itself through day 6 is week 1, days 7-13 are week 2, and
/// so on. Dates before the start collapse to week 1, and a missing start
/// date always yields week 1; the function never fails.
pub fn week_number(date: NaiveDate, start: Option<NaiveDate>) -> WeekNumber {
    let Some(start) = start else {
        return 1;
    };
    let days = (date - start).num_days().max(0);
    (days / 7) as WeekNumber + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn start_date_is_week_one() {
        let start = date("2025-05-19");
        assert_eq!(week_number(start, Some(start)), 1);
    }

    #[test]
    fn week_boundaries() {
        let start = date("2025-05-19");
        assert_eq!(week_number(start + Days::new(6), Some(start)), 1);
        assert_eq!(week_number(start + Days::new(7), Some(start)), 2);
        assert_eq!(week_number(start + Days::new(13), Some(start)), 2);
        assert_eq!(week_number(start + Days::new(70), Some(start)), 11);
    }

    #[test]
    fn missing_start_defaults_to_week_one() {
        assert_eq!(week_number(date("2025-07-01"), None), 1);
    }

    #[test]
    fn dates_before_start_clamp_to_week_one() {
        let start = date("2025-05-19");
        assert_eq!(week_number(date("2025-05-01"), Some(start)), 1);
    }
}
