use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::HashSet;
use uuid::Uuid;

use crate::security::error_sanitizer::ApiError;

pub const MIN_LESSONS_PER_DAY: u32 = 1;
pub const MAX_LESSONS_PER_DAY: u32 = 5;

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub start_date: NaiveDate,
    pub lessons_per_day: u32,
    pub rest_days: Vec<Weekday>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedLesson {
    pub lesson_id: Uuid,
    pub scheduled_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("rest_days must leave at least one study day per week")]
    NoStudyDays,
    #[error("lessons_per_day must be between 1 and 5, got {0}")]
    LessonsPerDay(u32),
    #[error("schedule runs past the last supported date")]
    DateOutOfRange,
}

impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl PlanOptions {
    pub fn validate(&self) -> Result<(), PlanError> {
        if !(MIN_LESSONS_PER_DAY..=MAX_LESSONS_PER_DAY).contains(&self.lessons_per_day) {
            return Err(PlanError::LessonsPerDay(self.lessons_per_day));
        }
        let rest: HashSet<Weekday> = self.rest_days.iter().copied().collect();
        if rest.len() >= 7 {
            return Err(PlanError::NoStudyDays);
        }
        Ok(())
    }

    fn is_rest_day(&self, date: NaiveDate) -> bool {
        self.rest_days.contains(&date.weekday())
    }

    fn next_study_day(&self, mut date: NaiveDate) -> Result<NaiveDate, PlanError> {
        while self.is_rest_day(date) {
            date = following_day(date)?;
        }
        Ok(date)
    }
}

fn following_day(date: NaiveDate) -> Result<NaiveDate, PlanError> {
    date.checked_add_days(Days::new(1))
        .ok_or(PlanError::DateOutOfRange)
}

/// Walks `lesson_ids` in order, skipping `skip`, and fills each study day
/// with up to `lessons_per_day` lessons starting at `start_date`.
pub fn plan_lessons(
    lesson_ids: &[Uuid],
    skip: &HashSet<Uuid>,
    options: &PlanOptions,
) -> Result<Vec<PlannedLesson>, PlanError> {
    options.validate()?;

    let mut planned = Vec::new();
    let mut day = options.next_study_day(options.start_date)?;
    let mut used_today = 0;

    for lesson_id in lesson_ids.iter().filter(|id| !skip.contains(id)) {
        if used_today == options.lessons_per_day {
            day = options.next_study_day(following_day(day)?)?;
            used_today = 0;
        }
        planned.push(PlannedLesson {
            lesson_id: *lesson_id,
            scheduled_date: day,
        });
        used_today += 1;
    }

    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lessons(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn options(start: NaiveDate, per_day: u32, rest: Vec<Weekday>) -> PlanOptions {
        PlanOptions {
            start_date: start,
            lessons_per_day: per_day,
            rest_days: rest,
        }
    }

    #[test]
    fn test_one_lesson_per_day_skips_sunday() {
        // 2024-05-03 is a Friday
        let ids = lessons(3);
        let plan = plan_lessons(&ids, &HashSet::new(), &options(date(2024, 5, 3), 1, vec![Weekday::Sun])).unwrap();

        let dates: Vec<NaiveDate> = plan.iter().map(|p| p.scheduled_date).collect();
        assert_eq!(dates, vec![date(2024, 5, 3), date(2024, 5, 4), date(2024, 5, 6)]);
        assert_eq!(plan[2].lesson_id, ids[2]);
    }

    #[test]
    fn test_start_on_rest_day_moves_forward() {
        let ids = lessons(1);
        let plan = plan_lessons(&ids, &HashSet::new(), &options(date(2024, 5, 5), 1, vec![Weekday::Sun])).unwrap();
        assert_eq!(plan[0].scheduled_date, date(2024, 5, 6));
    }

    #[test]
    fn test_several_lessons_per_day() {
        let ids = lessons(5);
        let plan = plan_lessons(&ids, &HashSet::new(), &options(date(2024, 5, 6), 2, vec![])).unwrap();
        let dates: Vec<NaiveDate> = plan.iter().map(|p| p.scheduled_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 5, 6),
                date(2024, 5, 6),
                date(2024, 5, 7),
                date(2024, 5, 7),
                date(2024, 5, 8)
            ]
        );
    }

    #[test]
    fn test_completed_lessons_are_skipped() {
        let ids = lessons(3);
        let skip: HashSet<Uuid> = [ids[0]].into_iter().collect();
        let plan = plan_lessons(&ids, &skip, &options(date(2024, 5, 6), 1, vec![])).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].lesson_id, ids[1]);
        assert_eq!(plan[0].scheduled_date, date(2024, 5, 6));
    }

    #[test]
    fn test_everything_completed_gives_empty_plan() {
        let ids = lessons(2);
        let skip: HashSet<Uuid> = ids.iter().copied().collect();
        let plan = plan_lessons(&ids, &skip, &options(date(2024, 5, 6), 1, vec![])).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_all_rest_days_rejected() {
        let week = vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ];
        let err = plan_lessons(&lessons(1), &HashSet::new(), &options(date(2024, 5, 6), 1, week)).unwrap_err();
        assert_eq!(err, PlanError::NoStudyDays);
    }

    #[test]
    fn test_lessons_per_day_bounds() {
        for bad in [0, 6] {
            let err = plan_lessons(&lessons(1), &HashSet::new(), &options(date(2024, 5, 6), bad, vec![])).unwrap_err();
            assert_eq!(err, PlanError::LessonsPerDay(bad));
        }
    }

    #[test]
    fn test_plan_past_last_date_is_rejected() {
        let ids = lessons(2);
        let err = plan_lessons(&ids, &HashSet::new(), &options(NaiveDate::MAX, 1, vec![])).unwrap_err();
        assert_eq!(err, PlanError::DateOutOfRange);

        let single = plan_lessons(&ids[..1], &HashSet::new(), &options(NaiveDate::MAX, 1, vec![])).unwrap();
        assert_eq!(single[0].scheduled_date, NaiveDate::MAX);
    }

    #[test]
    fn test_rest_day_at_last_date_is_rejected() {
        let rest = vec![NaiveDate::MAX.weekday()];
        let err = plan_lessons(&lessons(1), &HashSet::new(), &options(NaiveDate::MAX, 1, rest)).unwrap_err();
        assert_eq!(err, PlanError::DateOutOfRange);
    }
}
