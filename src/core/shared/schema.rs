diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Text,
        password_hash -> Text,
        full_name -> Text,
        role -> Text,
        target_score -> Nullable<Int4>,
        current_level -> Nullable<Text>,
        avatar_url -> Nullable<Text>,
        phone -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        last_login_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    lessons (id) {
        id -> Uuid,
        title -> Text,
        description -> Nullable<Text>,
        lesson_type -> Text,
        toeic_part -> Nullable<Int4>,
        level -> Text,
        order_index -> Int4,
        duration_minutes -> Int4,
        is_premium -> Bool,
        is_published -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    reading_passages (id) {
        id -> Uuid,
        lesson_id -> Uuid,
        title -> Text,
        content -> Text,
        order_index -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    listening_passages (id) {
        id -> Uuid,
        lesson_id -> Uuid,
        title -> Text,
        audio_url -> Text,
        transcript -> Nullable<Text>,
        image_url -> Nullable<Text>,
        order_index -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    questions (id) {
        id -> Uuid,
        lesson_id -> Uuid,
        reading_passage_id -> Nullable<Uuid>,
        listening_passage_id -> Nullable<Uuid>,
        content -> Text,
        explanation -> Nullable<Text>,
        points -> Int4,
        order_index -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    answer_options (id) {
        id -> Uuid,
        question_id -> Uuid,
        label -> Text,
        content -> Text,
        is_correct -> Bool,
    }
}

diesel::table! {
    exercise_results (id) {
        id -> Uuid,
        user_id -> Uuid,
        lesson_id -> Uuid,
        score -> Int4,
        max_score -> Int4,
        correct_count -> Int4,
        total_questions -> Int4,
        percentage -> Float8,
        attempt_number -> Int4,
        duration_seconds -> Int4,
        submitted_at -> Timestamptz,
    }
}

diesel::table! {
    submitted_answers (id) {
        id -> Uuid,
        result_id -> Uuid,
        question_id -> Uuid,
        selected_option_id -> Nullable<Uuid>,
        is_correct -> Bool,
        points_earned -> Int4,
    }
}

diesel::table! {
    user_progress (id) {
        id -> Uuid,
        user_id -> Uuid,
        lesson_id -> Uuid,
        status -> Text,
        best_percentage -> Float8,
        last_percentage -> Float8,
        attempts -> Int4,
        last_activity_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    roadmaps (id) {
        id -> Uuid,
        title -> Text,
        description -> Nullable<Text>,
        target_score -> Int4,
        level -> Text,
        duration_weeks -> Int4,
        is_published -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    roadmap_lessons (id) {
        id -> Uuid,
        roadmap_id -> Uuid,
        lesson_id -> Uuid,
        order_index -> Int4,
    }
}

diesel::table! {
    roadmap_registrations (id) {
        id -> Uuid,
        user_id -> Uuid,
        roadmap_id -> Uuid,
        status -> Text,
        registered_at -> Timestamptz,
    }
}

diesel::table! {
    study_schedules (id) {
        id -> Uuid,
        user_id -> Uuid,
        roadmap_id -> Nullable<Uuid>,
        lesson_id -> Uuid,
        scheduled_date -> Date,
        is_completed -> Bool,
        note -> Nullable<Text>,
        created_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(reading_passages -> lessons (lesson_id));
diesel::joinable!(listening_passages -> lessons (lesson_id));
diesel::joinable!(questions -> lessons (lesson_id));
diesel::joinable!(answer_options -> questions (question_id));
diesel::joinable!(exercise_results -> lessons (lesson_id));
diesel::joinable!(exercise_results -> users (user_id));
diesel::joinable!(submitted_answers -> exercise_results (result_id));
diesel::joinable!(submitted_answers -> questions (question_id));
diesel::joinable!(user_progress -> lessons (lesson_id));
diesel::joinable!(roadmap_lessons -> lessons (lesson_id));
diesel::joinable!(roadmap_lessons -> roadmaps (roadmap_id));
diesel::joinable!(roadmap_registrations -> roadmaps (roadmap_id));
diesel::joinable!(study_schedules -> lessons (lesson_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    lessons,
    reading_passages,
    listening_passages,
    questions,
    answer_options,
    exercise_results,
    submitted_answers,
    user_progress,
    roadmaps,
    roadmap_lessons,
    roadmap_registrations,
    study_schedules,
);
