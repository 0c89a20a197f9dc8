use axum::{http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::shared::schema::*;

pub use self::enums::*;

pub mod enums {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum UserRole {
        HocVien,
        Premium,
        Admin,
    }

    impl UserRole {
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::HocVien => "hoc_vien",
                Self::Premium => "premium",
                Self::Admin => "admin",
            }
        }

        pub fn is_admin(&self) -> bool {
            matches!(self, Self::Admin)
        }

        /// Premium lessons are open to premium accounts and admins.
        pub fn can_access_premium(&self) -> bool {
            matches!(self, Self::Premium | Self::Admin)
        }
    }

    impl From<&str> for UserRole {
        fn from(s: &str) -> Self {
            match s {
                "premium" => Self::Premium,
                "admin" => Self::Admin,
                _ => Self::HocVien,
            }
        }
    }

    impl std::fmt::Display for UserRole {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }

    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[serde(rename_all = "snake_case")]
    pub enum LessonType {
        Reading,
        Listening,
        Grammar,
        Vocabulary,
    }

    impl LessonType {
        pub const ALL: [&'static str; 4] = ["reading", "listening", "grammar", "vocabulary"];

        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Reading => "reading",
                Self::Listening => "listening",
                Self::Grammar => "grammar",
                Self::Vocabulary => "vocabulary",
            }
        }

        pub fn parse(s: &str) -> Option<Self> {
            match s {
                "reading" => Some(Self::Reading),
                "listening" => Some(Self::Listening),
                "grammar" => Some(Self::Grammar),
                "vocabulary" => Some(Self::Vocabulary),
                _ => None,
            }
        }
    }

    impl std::fmt::Display for LessonType {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }

    pub const LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];

    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum ProgressStatus {
        NotStarted,
        InProgress,
        Completed,
    }

    impl ProgressStatus {
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::NotStarted => "not_started",
                Self::InProgress => "in_progress",
                Self::Completed => "completed",
            }
        }
    }

    impl From<&str> for ProgressStatus {
        fn from(s: &str) -> Self {
            match s {
                "in_progress" => Self::InProgress,
                "completed" => Self::Completed,
                _ => Self::NotStarted,
            }
        }
    }

    impl std::fmt::Display for ProgressStatus {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }

    pub const REGISTRATION_ACTIVE: &str = "active";
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }

    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::ok(data))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub target_score: Option<i32>,
    pub current_level: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub target_score: Option<i32>,
    pub current_level: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            target_score: user.target_score,
            current_level: user.current_level,
            avatar_url: user.avatar_url,
            phone: user.phone,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = lessons)]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub lesson_type: String,
    pub toeic_part: Option<i32>,
    pub level: String,
    pub order_index: i32,
    pub duration_minutes: i32,
    pub is_premium: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    pub fn is_locked_for(&self, role: Option<UserRole>) -> bool {
        self.is_premium && !role.is_some_and(|r| r.can_access_premium())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = reading_passages)]
pub struct ReadingPassage {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub title: String,
    pub content: String,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = listening_passages)]
pub struct ListeningPassage {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub title: String,
    pub audio_url: String,
    pub transcript: Option<String>,
    pub image_url: Option<String>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = questions)]
pub struct Question {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub reading_passage_id: Option<Uuid>,
    pub listening_passage_id: Option<Uuid>,
    pub content: String,
    pub explanation: Option<String>,
    pub points: i32,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = answer_options)]
pub struct AnswerOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub label: String,
    pub content: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = exercise_results)]
pub struct ExerciseResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub score: i32,
    pub max_score: i32,
    pub correct_count: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub attempt_number: i32,
    pub duration_seconds: i32,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = submitted_answers)]
pub struct SubmittedAnswer {
    pub id: Uuid,
    pub result_id: Uuid,
    pub question_id: Uuid,
    pub selected_option_id: Option<Uuid>,
    pub is_correct: bool,
    pub points_earned: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = user_progress)]
pub struct UserProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub status: String,
    pub best_percentage: f64,
    pub last_percentage: f64,
    pub attempts: i32,
    pub last_activity_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = roadmaps)]
pub struct Roadmap {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_score: i32,
    pub level: String,
    pub duration_weeks: i32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = roadmap_lessons)]
pub struct RoadmapLesson {
    pub id: Uuid,
    pub roadmap_id: Uuid,
    pub lesson_id: Uuid,
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = roadmap_registrations)]
pub struct RoadmapRegistration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub roadmap_id: Uuid,
    pub status: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = study_schedules)]
pub struct StudySchedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub roadmap_id: Option<Uuid>,
    pub lesson_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub is_completed: bool,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
