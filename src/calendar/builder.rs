//! Materializes the fixed calendar window from sparse daily counts.

use chrono::{Days, NaiveDate};

use crate::models::{ContributionCalendar, ContributionDay, DailyCounts};

/// Number of days in a calendar, today included.
pub const WINDOW_DAYS: u32 = 365;

/// First date of the window that ends at `today`.
pub fn window_start(today: NaiveDate) -> NaiveDate {
    today - Days::new(u64::from(WINDOW_DAYS - 1))
}

/// Every date of the window ending at `today`, oldest first.
pub fn window_dates(today: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    window_start(today).iter_days().take(WINDOW_DAYS as usize)
}

/// Build the calendar ending at `today`.
///
/// Dates missing from `counts` get a zero count. Dates outside the window are
/// dropped. Levels start at zero and are filled in by the classifier.
pub fn build_calendar(today: NaiveDate, counts: &DailyCounts) -> ContributionCalendar {
    let start = window_start(today);

    let dropped = counts
        .keys()
        .filter(|date| **date < start || **date > today)
        .count();
    if dropped > 0 {
        tracing::debug!(
            "Dropping {} days outside {}..={}",
            dropped,
            start,
            today
        );
    }

    let days = window_dates(today)
        .map(|date| {
            let count = counts.get(&date).copied().unwrap_or(0);
            (date, ContributionDay { date, count, level: 0 })
        })
        .collect();

    ContributionCalendar { days }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::test_support::{counts_ending_at, today};
    use proptest::prelude::*;

    #[test]
    fn test_window_covers_365_days_ending_today() {
        let calendar = build_calendar(today(), &DailyCounts::new());

        assert_eq!(calendar.len(), 365);
        assert_eq!(calendar.last_date(), Some(today()));
        assert_eq!(
            calendar.first_date(),
            NaiveDate::from_ymd_opt(2025, 10, 17)
        );
        assert!(calendar.days().all(|d| d.count == 0 && d.level == 0));
    }

    #[test]
    fn test_counts_copied_and_outside_dates_dropped() {
        let mut counts = counts_ending_at(today(), &[4, 0, 9]);
        counts.insert(today() + Days::new(1), 50);
        counts.insert(window_start(today()) - Days::new(1), 60);

        let calendar = build_calendar(today(), &counts);

        assert_eq!(calendar.len(), 365);
        assert_eq!(calendar.total(), 13);
        assert_eq!(calendar.get(today()).map(|d| d.count), Some(9));
        assert_eq!(
            calendar.get(today() - Days::new(2)).map(|d| d.count),
            Some(4)
        );
    }

    #[test]
    fn test_window_across_leap_day() {
        let today = NaiveDate::from_ymd_opt(2028, 3, 1).unwrap();
        let calendar = build_calendar(today, &DailyCounts::new());

        assert_eq!(calendar.len(), 365);
        assert!(calendar
            .get(NaiveDate::from_ymd_opt(2028, 2, 29).unwrap())
            .is_some());
        assert_eq!(calendar.first_date(), NaiveDate::from_ymd_opt(2027, 3, 3));
    }

    proptest! {
        #[test]
        fn calendar_is_contiguous(
            offset in 0u64..20_000,
            sparse in proptest::collection::btree_map(0u64..400, 0u32..50, 0..60)
        ) {
            let today = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + Days::new(offset);
            let counts: DailyCounts = sparse
                .into_iter()
                .map(|(back, count)| (today - Days::new(back), count))
                .collect();

            let calendar = build_calendar(today, &counts);

            prop_assert_eq!(calendar.len(), WINDOW_DAYS as usize);
            prop_assert_eq!(calendar.last_date(), Some(today));
            let dates: Vec<NaiveDate> = calendar.days().map(|d| d.date).collect();
            for pair in dates.windows(2) {
                prop_assert_eq!(pair[0].succ_opt(), Some(pair[1]));
            }
        }
    }
}
