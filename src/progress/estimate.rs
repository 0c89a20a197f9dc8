use serde::Serialize;

use crate::core::shared::models::LessonType;

pub const SECTION_MIN: i32 = 5;
pub const SECTION_MAX: i32 = 495;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToeicSection {
    Listening,
    Reading,
}

impl From<LessonType> for ToeicSection {
    /// Grammar and vocabulary are scored on the reading section.
    fn from(lesson_type: LessonType) -> Self {
        match lesson_type {
            LessonType::Listening => Self::Listening,
            LessonType::Reading | LessonType::Grammar | LessonType::Vocabulary => Self::Reading,
        }
    }
}

/// `5 + round(pct / 100 * 490)`, clamped to the section range.
pub fn section_score(percentage: f64) -> i32 {
    let raw = SECTION_MIN + (percentage / 100.0 * 490.0).round() as i32;
    raw.clamp(SECTION_MIN, SECTION_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EstimatedScore {
    pub listening: Option<i32>,
    pub reading: Option<i32>,
    pub total: Option<i32>,
}

/// A section without any result counts as the section minimum in the total.
pub fn estimate_score(listening_avg: Option<f64>, reading_avg: Option<f64>) -> EstimatedScore {
    let listening = listening_avg.map(section_score);
    let reading = reading_avg.map(section_score);
    let total = match (listening, reading) {
        (None, None) => None,
        (l, r) => Some(l.unwrap_or(SECTION_MIN) + r.unwrap_or(SECTION_MIN)),
    };

    EstimatedScore {
        listening,
        reading,
        total,
    }
}
