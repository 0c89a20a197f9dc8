use chrono::{DateTime, NaiveDate, Utc, Weekday};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::LearningConfig;
use crate::core::shared::models::StudySchedule;
use crate::core::shared::schema::study_schedules;
use crate::schedules::planner::PlanOptions;
use crate::security::validation::{ValidationError, Validator};

pub const NOTE_MAX: usize = 500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ScheduleQuery {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let ordered = match (self.from, self.to) {
            (Some(from), Some(to)) => from <= to,
            _ => true,
        };
        Validator::new()
            .check(ordered, "from", "must not be after to")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    #[serde(flatten)]
    pub schedule: StudySchedule,
    pub lesson_title: String,
    pub lesson_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateScheduleRequest {
    pub lesson_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub note: Option<String>,
}

impl CreateScheduleRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_note(self.note.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScheduleRequest {
    pub is_completed: Option<bool>,
    pub note: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
}

impl UpdateScheduleRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .check(
                self.is_completed.is_some() || self.note.is_some() || self.scheduled_date.is_some(),
                "body",
                "nothing to update",
            )
            .finish()?;
        validate_note(self.note.as_deref())
    }

    /// Completion toggles keep `completed_at` in step with `is_completed`.
    pub fn into_changes(self, current: &StudySchedule, now: DateTime<Utc>) -> ScheduleChanges {
        let completed_at = match self.is_completed {
            Some(true) if !current.is_completed => Some(Some(now)),
            Some(false) if current.is_completed => Some(None),
            _ => None,
        };
        ScheduleChanges {
            is_completed: self.is_completed,
            note: self.note.map(|n| n.trim().to_string()),
            scheduled_date: self.scheduled_date,
            completed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = study_schedules)]
pub struct ScheduleChanges {
    pub is_completed: Option<bool>,
    pub note: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedSchedule {
    pub id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateScheduleRequest {
    pub roadmap_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub lessons_per_day: Option<u32>,
    pub rest_days: Option<Vec<Weekday>>,
    #[serde(default)]
    pub replace_existing: bool,
}

impl GenerateScheduleRequest {
    /// Fills unset fields from the learning defaults.
    pub fn plan_options(&self, defaults: &LearningConfig, today: NaiveDate) -> PlanOptions {
        PlanOptions {
            start_date: self.start_date.unwrap_or(today),
            lessons_per_day: self.lessons_per_day.unwrap_or(defaults.lessons_per_day),
            rest_days: self
                .rest_days
                .clone()
                .unwrap_or_else(|| defaults.rest_days.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSchedule {
    pub roadmap_id: Uuid,
    pub schedules: Vec<StudySchedule>,
    pub removed: usize,
    pub skipped_completed: usize,
    pub end_date: Option<NaiveDate>,
}

fn validate_note(note: Option<&str>) -> Result<(), ValidationError> {
    match note {
        Some(text) => Validator::new()
            .length(text, "note", None, Some(NOTE_MAX))
            .finish(),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(is_completed: bool) -> StudySchedule {
        StudySchedule {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            roadmap_id: None,
            lesson_id: Uuid::new_v4(),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            is_completed,
            note: None,
            created_at: Utc::now(),
            completed_at: if is_completed { Some(Utc::now()) } else { None },
        }
    }

    #[test]
    fn test_query_range_order() {
        let query = ScheduleQuery {
            from: NaiveDate::from_ymd_opt(2024, 5, 10),
            to: NaiveDate::from_ymd_opt(2024, 5, 1),
        };
        assert!(query.validate().is_err());
        assert!(ScheduleQuery::default().validate().is_ok());
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(UpdateScheduleRequest::default().validate().is_err());
    }

    #[test]
    fn test_completing_sets_timestamp() {
        let now = Utc::now();
        let req = UpdateScheduleRequest {
            is_completed: Some(true),
            ..Default::default()
        };
        let changes = req.into_changes(&schedule(false), now);
        assert_eq!(changes.completed_at, Some(Some(now)));
    }

    #[test]
    fn test_reopening_clears_timestamp() {
        let req = UpdateScheduleRequest {
            is_completed: Some(false),
            ..Default::default()
        };
        let changes = req.into_changes(&schedule(true), Utc::now());
        assert_eq!(changes.completed_at, Some(None));
    }

    #[test]
    fn test_note_only_leaves_completion_alone() {
        let req = UpdateScheduleRequest {
            note: Some("  ôn lại  ".into()),
            ..Default::default()
        };
        let changes = req.into_changes(&schedule(true), Utc::now());
        assert_eq!(changes.completed_at, None);
        assert_eq!(changes.note.as_deref(), Some("ôn lại"));
    }

    #[test]
    fn test_plan_options_defaults() {
        let body = serde_json::json!({ "roadmap_id": Uuid::new_v4() });
        let req: GenerateScheduleRequest = serde_json::from_value(body).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let options = req.plan_options(&LearningConfig::default(), today);

        assert_eq!(options.start_date, today);
        assert_eq!(options.lessons_per_day, 1);
        assert_eq!(options.rest_days, vec![Weekday::Sun]);
        assert!(!req.replace_existing);
    }

    #[test]
    fn test_rest_days_accept_weekday_names() {
        let body = serde_json::json!({
            "roadmap_id": Uuid::new_v4(),
            "rest_days": ["Sat", "Sun"],
            "lessons_per_day": 2
        });
        let req: GenerateScheduleRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.rest_days, Some(vec![Weekday::Sat, Weekday::Sun]));
    }
}
