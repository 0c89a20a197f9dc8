use diesel::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::shared::models::{AnswerOption, Lesson, Question, UserRole};
use crate::core::shared::schema::{answer_options, lessons, questions};
use crate::security::error_sanitizer::{ApiError, ApiResult};

/// Published lesson, or any lesson for admins.
pub fn load_visible_lesson(
    conn: &mut PgConnection,
    lesson_id: Uuid,
    role: Option<UserRole>,
) -> ApiResult<Lesson> {
    let lesson: Lesson = lessons::table
        .find(lesson_id)
        .select(Lesson::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Lesson".to_string()))?;

    if !lesson.is_published && !role.is_some_and(|r| r.is_admin()) {
        return Err(ApiError::NotFound("Lesson".to_string()));
    }
    Ok(lesson)
}

pub fn ensure_unlocked(lesson: &Lesson, role: Option<UserRole>) -> ApiResult<()> {
    if lesson.is_locked_for(role) {
        return Err(ApiError::locked_lesson());
    }
    Ok(())
}

pub fn load_lesson_exists(conn: &mut PgConnection, lesson_id: Uuid) -> ApiResult<Lesson> {
    lessons::table
        .find(lesson_id)
        .select(Lesson::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Lesson".to_string()))
}

pub enum QuestionScope {
    Lesson(Uuid),
    Reading(Uuid),
    Listening(Uuid),
}

/// Questions in display order, each with its options ordered by label.
pub fn load_questions_with_options(
    conn: &mut PgConnection,
    scope: QuestionScope,
) -> ApiResult<Vec<(Question, Vec<AnswerOption>)>> {
    let mut query = questions::table.into_boxed();
    query = match scope {
        QuestionScope::Lesson(id) => query.filter(questions::lesson_id.eq(id)),
        QuestionScope::Reading(id) => query.filter(questions::reading_passage_id.eq(id)),
        QuestionScope::Listening(id) => query.filter(questions::listening_passage_id.eq(id)),
    };

    let question_rows: Vec<Question> = query
        .select(Question::as_select())
        .order((questions::order_index.asc(), questions::created_at.asc()))
        .load(conn)?;

    let ids: Vec<Uuid> = question_rows.iter().map(|q| q.id).collect();
    let option_rows: Vec<AnswerOption> = answer_options::table
        .filter(answer_options::question_id.eq_any(&ids))
        .select(AnswerOption::as_select())
        .order(answer_options::label.asc())
        .load(conn)?;

    let mut grouped: HashMap<Uuid, Vec<AnswerOption>> = HashMap::new();
    for option in option_rows {
        grouped.entry(option.question_id).or_default().push(option);
    }

    Ok(question_rows
        .into_iter()
        .map(|q| {
            let options = grouped.remove(&q.id).unwrap_or_default();
            (q, options)
        })
        .collect())
}
