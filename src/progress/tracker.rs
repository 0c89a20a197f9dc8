use chrono::{DateTime, Utc};

use crate::core::shared::models::{ProgressStatus, UserProgress};

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub status: ProgressStatus,
    pub best_percentage: f64,
    pub last_percentage: f64,
    pub attempts: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Folds one graded attempt into the stored progress row. Attempts only grow,
/// the best score never drops and `completed_at` keeps the first completion.
pub fn apply_attempt(
    previous: Option<&UserProgress>,
    percentage: f64,
    pass_percentage: f64,
    now: DateTime<Utc>,
) -> ProgressUpdate {
    let attempts = previous.map_or(0, |p| p.attempts) + 1;
    let best_percentage = previous.map_or(percentage, |p| p.best_percentage.max(percentage));

    let status = if best_percentage >= pass_percentage {
        ProgressStatus::Completed
    } else {
        ProgressStatus::InProgress
    };

    let completed_at = match previous.and_then(|p| p.completed_at) {
        Some(first) => Some(first),
        None if status == ProgressStatus::Completed => Some(now),
        None => None,
    };

    ProgressUpdate {
        status,
        best_percentage,
        last_percentage: percentage,
        attempts,
        completed_at,
    }
}
