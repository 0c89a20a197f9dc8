use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
    pub active_days: u32,
}

pub fn activity_dates<'a, I>(timestamps: I) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = &'a DateTime<Utc>>,
{
    timestamps.into_iter().map(|ts| ts.date_naive()).collect()
}

/// Current streak walks back from `today` and is zero when today has no
/// activity. Longest streak is the longest run of consecutive dates.
pub fn compute_streaks(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> StreakSummary {
    let mut current = 0;
    let mut day = Some(today);
    while let Some(d) = day {
        if !dates.contains(&d) {
            break;
        }
        current += 1;
        day = d.pred_opt();
    }

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &date in dates {
        run = match previous.and_then(|p| p.succ_opt()) {
            Some(next) if next == date => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }

    StreakSummary {
        current,
        longest,
        active_days: dates.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn set(dates: &[NaiveDate]) -> BTreeSet<NaiveDate> {
        dates.iter().copied().collect()
    }

    #[test]
    fn test_empty_history() {
        let summary = compute_streaks(&BTreeSet::new(), date(2024, 5, 10));
        assert_eq!(summary, StreakSummary::default());
    }

    #[test]
    fn test_current_streak_counts_back_from_today() {
        let today = date(2024, 5, 10);
        let dates = set(&[date(2024, 5, 8), date(2024, 5, 9), date(2024, 5, 10)]);
        let summary = compute_streaks(&dates, today);
        assert_eq!(summary.current, 3);
        assert_eq!(summary.longest, 3);
    }

    #[test]
    fn test_no_activity_today_breaks_current() {
        let today = date(2024, 5, 10);
        let dates = set(&[date(2024, 5, 8), date(2024, 5, 9)]);
        let summary = compute_streaks(&dates, today);
        assert_eq!(summary.current, 0);
        assert_eq!(summary.longest, 2);
    }

    #[test]
    fn test_longest_run_in_the_past() {
        let today = date(2024, 5, 10);
        let dates = set(&[
            date(2024, 4, 1),
            date(2024, 4, 2),
            date(2024, 4, 3),
            date(2024, 4, 4),
            date(2024, 5, 9),
            date(2024, 5, 10),
        ]);
        let summary = compute_streaks(&dates, today);
        assert_eq!(summary.current, 2);
        assert_eq!(summary.longest, 4);
        assert_eq!(summary.active_days, 6);
    }

    #[test]
    fn test_run_across_month_boundary() {
        let dates = set(&[date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]);
        assert_eq!(compute_streaks(&dates, date(2024, 3, 1)).current, 3);
    }

    #[test]
    fn test_activity_dates_use_utc_and_dedupe() {
        let stamps = vec![
            Utc.with_ymd_and_hms(2024, 5, 9, 23, 59, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 9, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 10, 0, 1, 0).unwrap(),
        ];
        let dates = activity_dates(&stamps);
        assert_eq!(dates.len(), 2);
        assert!(dates.contains(&date(2024, 5, 9)));
    }
}
