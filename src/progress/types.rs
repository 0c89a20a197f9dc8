use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::core::shared::models::{LessonType, UserProgress};
use crate::core::shared::utils::{format_minutes, format_percentage, format_ratio, percentage, round2};
use crate::progress::estimate::{estimate_score, EstimatedScore, ToeicSection};
use crate::progress::streak::{activity_dates, compute_streaks};

pub const RECENT_RESULTS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEntry {
    #[serde(flatten)]
    pub progress: UserProgress,
    pub lesson_title: String,
    pub lesson_type: String,
    pub best_percentage_text: String,
}

/// One graded attempt as needed by the dashboard.
#[derive(Debug, Clone)]
pub struct ResultFact {
    pub result_id: Uuid,
    pub lesson_id: Uuid,
    pub lesson_title: String,
    pub lesson_type: String,
    pub percentage: f64,
    pub correct_count: i32,
    pub total_questions: i32,
    pub duration_seconds: i32,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeAverage {
    pub lesson_type: String,
    pub attempts: i64,
    pub average_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentResult {
    pub result_id: Uuid,
    pub lesson_id: Uuid,
    pub lesson_title: String,
    pub lesson_type: String,
    pub percentage: f64,
    pub percentage_text: String,
    pub ratio_text: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub lessons_completed: i64,
    pub lessons_in_progress: i64,
    pub total_lessons: i64,
    pub completion_percentage: f64,
    pub completion_ratio_text: String,
    pub total_attempts: i64,
    pub average_percentage: f64,
    pub average_percentage_text: String,
    pub best_percentage: f64,
    pub total_study_minutes: i64,
    pub study_time_text: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub type_averages: Vec<TypeAverage>,
    pub recent_results: Vec<RecentResult>,
    pub estimated_score: EstimatedScore,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LessonCounts {
    pub completed: i64,
    pub in_progress: i64,
    pub total_published: i64,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Average percentage per lesson type, ordered by type name.
pub fn type_averages(results: &[ResultFact]) -> Vec<TypeAverage> {
    let mut by_type: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for result in results {
        by_type
            .entry(result.lesson_type.as_str())
            .or_default()
            .push(result.percentage);
    }

    by_type
        .into_iter()
        .map(|(lesson_type, values)| TypeAverage {
            lesson_type: lesson_type.to_string(),
            attempts: values.len() as i64,
            average_percentage: mean(&values).map(round2).unwrap_or(0.0),
        })
        .collect()
}

/// Section averages over all results fed into the TOEIC score estimate.
pub fn estimate_from_results(results: &[ResultFact]) -> EstimatedScore {
    let mut listening = Vec::new();
    let mut reading = Vec::new();
    for result in results {
        match LessonType::parse(&result.lesson_type).map(ToeicSection::from) {
            Some(ToeicSection::Listening) => listening.push(result.percentage),
            Some(ToeicSection::Reading) => reading.push(result.percentage),
            None => {}
        }
    }
    estimate_score(mean(&listening), mean(&reading))
}

pub fn build_dashboard(results: &[ResultFact], counts: LessonCounts, today: NaiveDate) -> Dashboard {
    let percentages: Vec<f64> = results.iter().map(|r| r.percentage).collect();
    let average_percentage = mean(&percentages).map(round2).unwrap_or(0.0);
    let best_percentage = percentages.iter().copied().fold(0.0, f64::max);
    let total_seconds: i64 = results.iter().map(|r| r.duration_seconds.max(0) as i64).sum();

    let streaks = compute_streaks(&activity_dates(results.iter().map(|r| &r.submitted_at)), today);

    let type_averages = type_averages(results);
    let estimated_score = estimate_from_results(results);

    let mut recent: Vec<&ResultFact> = results.iter().collect();
    recent.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    let recent_results = recent
        .into_iter()
        .take(RECENT_RESULTS)
        .map(|r| RecentResult {
            result_id: r.result_id,
            lesson_id: r.lesson_id,
            lesson_title: r.lesson_title.clone(),
            lesson_type: r.lesson_type.clone(),
            percentage: r.percentage,
            percentage_text: format_percentage(r.percentage),
            ratio_text: format_ratio(r.correct_count as i64, r.total_questions as i64),
            submitted_at: r.submitted_at,
        })
        .collect();

    Dashboard {
        lessons_completed: counts.completed,
        lessons_in_progress: counts.in_progress,
        total_lessons: counts.total_published,
        completion_percentage: percentage(counts.completed, counts.total_published),
        completion_ratio_text: format_ratio(counts.completed, counts.total_published),
        total_attempts: results.len() as i64,
        average_percentage,
        average_percentage_text: format_percentage(average_percentage),
        best_percentage,
        total_study_minutes: total_seconds / 60,
        study_time_text: format_minutes(total_seconds),
        current_streak: streaks.current,
        longest_streak: streaks.longest,
        type_averages,
        recent_results,
        estimated_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fact(lesson_type: &str, pct: f64, at: DateTime<Utc>) -> ResultFact {
        ResultFact {
            result_id: Uuid::new_v4(),
            lesson_id: Uuid::new_v4(),
            lesson_title: format!("{lesson_type} lesson"),
            lesson_type: lesson_type.to_string(),
            percentage: pct,
            correct_count: 8,
            total_questions: 10,
            duration_seconds: 600,
            submitted_at: at,
        }
    }

    #[test]
    fn test_empty_dashboard() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let dashboard = build_dashboard(&[], LessonCounts::default(), today);
        assert_eq!(dashboard.total_attempts, 0);
        assert_eq!(dashboard.average_percentage, 0.0);
        assert_eq!(dashboard.completion_ratio_text, "0/0");
        assert_eq!(dashboard.current_streak, 0);
        assert!(dashboard.recent_results.is_empty());
        assert_eq!(dashboard.estimated_score.total, None);
    }

    #[test]
    fn test_dashboard_aggregates() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();
        let results: Vec<ResultFact> = vec![
            fact("reading", 80.0, now - Duration::days(1)),
            fact("listening", 60.0, now),
            fact("grammar", 100.0, now),
            fact("reading", 40.0, now - Duration::days(5)),
            fact("vocabulary", 70.0, now - Duration::days(6)),
            fact("listening", 90.0, now - Duration::days(7)),
        ];
        let counts = LessonCounts {
            completed: 3,
            in_progress: 2,
            total_published: 12,
        };

        let dashboard = build_dashboard(&results, counts, now.date_naive());
        assert_eq!(dashboard.total_attempts, 6);
        assert_eq!(dashboard.average_percentage, 73.33);
        assert_eq!(dashboard.best_percentage, 100.0);
        assert_eq!(dashboard.total_study_minutes, 60);
        assert_eq!(dashboard.study_time_text, "1 giờ 0 phút");
        assert_eq!(dashboard.completion_ratio_text, "3/12");
        assert_eq!(dashboard.completion_percentage, 25.0);
        assert_eq!(dashboard.current_streak, 2);
        assert_eq!(dashboard.longest_streak, 3);
        assert_eq!(dashboard.recent_results.len(), RECENT_RESULTS);
        assert!(dashboard.recent_results[0].submitted_at >= dashboard.recent_results[1].submitted_at);

        let reading = dashboard
            .type_averages
            .iter()
            .find(|t| t.lesson_type == "reading")
            .unwrap();
        assert_eq!(reading.attempts, 2);
        assert_eq!(reading.average_percentage, 60.0);

        assert_eq!(dashboard.estimated_score.listening, Some(373));
        assert_eq!(dashboard.estimated_score.reading, Some(360));
        assert_eq!(dashboard.estimated_score.total, Some(733));
    }
}
