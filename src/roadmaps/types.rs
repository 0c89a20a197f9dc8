use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::core::shared::models::enums::LEVELS;
use crate::core::shared::models::{Lesson, ProgressStatus, Roadmap};
use crate::core::shared::utils::{format_percentage, format_ratio, percentage};
use crate::security::validation::{ValidationError, Validator};

pub const MAX_DURATION_WEEKS: i32 = 104;

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapSummary {
    #[serde(flatten)]
    pub roadmap: Roadmap,
    pub lesson_count: i64,
    pub is_registered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapLessonEntry {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub position: i32,
    pub is_locked: bool,
    pub progress_status: Option<ProgressStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapDetail {
    pub roadmap: Roadmap,
    pub lessons: Vec<RoadmapLessonEntry>,
    pub is_registered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyRoadmap {
    pub roadmap: Roadmap,
    pub registered_at: DateTime<Utc>,
    pub completed_lessons: i64,
    pub total_lessons: i64,
    pub completion_percentage: f64,
    pub completion_text: String,
    pub ratio_text: String,
}

impl MyRoadmap {
    pub fn new(roadmap: Roadmap, registered_at: DateTime<Utc>, completed: i64, total: i64) -> Self {
        let completion_percentage = percentage(completed, total);
        Self {
            roadmap,
            registered_at,
            completed_lessons: completed,
            total_lessons: total,
            completion_text: format_percentage(completion_percentage),
            ratio_text: format_ratio(completed, total),
            completion_percentage,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoadmapRequest {
    pub title: String,
    pub description: Option<String>,
    pub target_score: i32,
    pub level: Option<String>,
    pub duration_weeks: Option<i32>,
    pub is_published: Option<bool>,
    pub lesson_ids: Vec<Uuid>,
}

impl CreateRoadmapRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        let unique = self.lesson_ids.iter().all(|id| seen.insert(*id));

        Validator::new()
            .required(&self.title, "title")
            .length(self.title.trim(), "title", None, Some(200))
            .target_score(Some(self.target_score))
            .one_of(self.level.as_deref(), "level", &LEVELS)
            .check(
                self.duration_weeks
                    .map_or(true, |w| (1..=MAX_DURATION_WEEKS).contains(&w)),
                "duration_weeks",
                "must be between 1 and 104",
            )
            .check(!self.lesson_ids.is_empty(), "lesson_ids", "must not be empty")
            .check(unique, "lesson_ids", "contains duplicate lessons")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedRoadmap {
    #[serde(flatten)]
    pub roadmap: Roadmap,
    pub lesson_ids: Vec<Uuid>,
}
