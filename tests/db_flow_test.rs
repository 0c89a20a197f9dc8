//! End-to-end flows against a real PostgreSQL database.
//!
//! Set `TEST_DATABASE_URL` to run them; without it every test returns early.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use diesel::prelude::*;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;
use uuid::Uuid;

use toeic_server::core::shared::schema::users;
use toeic_server::core::shared::utils::{create_conn, run_migrations};
use toeic_server::{create_router, AppConfig, AppState};

static MIGRATED: OnceLock<()> = OnceLock::new();

struct TestApp {
    router: Router,
    state: Arc<AppState>,
}

struct Account {
    id: Uuid,
    access: String,
    refresh: String,
}

impl TestApp {
    fn connect() -> Option<Self> {
        let url = std::env::var("TEST_DATABASE_URL").ok().filter(|u| !u.is_empty())?;

        let mut config = AppConfig::default();
        config.database.url = url;
        config.database.pool_size = 4;
        config.finalize().unwrap();

        let pool = create_conn(&config.database).unwrap();
        MIGRATED.get_or_init(|| run_migrations(&pool).unwrap());

        let state = Arc::new(AppState::new(pool, config).unwrap());
        Some(Self {
            router: create_router(Arc::clone(&state)),
            state,
        })
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn register(&self, full_name: &str) -> Account {
        let email = format!("hv-{}@example.com", Uuid::new_v4().simple());
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/dang-ky",
                None,
                Some(json!({ "email": email, "password": "matkhau123", "full_name": full_name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let data = &body["data"];
        Account {
            id: data["user"]["id"].as_str().unwrap().parse().unwrap(),
            access: data["tokens"]["access_token"].as_str().unwrap().to_string(),
            refresh: data["tokens"]["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    async fn admin(&self) -> Account {
        let mut account = self.register("Quản trị viên").await;
        let pool = self.state.conn.clone();
        let id = account.id;
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().unwrap();
            diesel::update(users::table.find(id))
                .set(users::role.eq("admin"))
                .execute(&mut conn)
                .unwrap();
        })
        .await
        .unwrap();

        account.access = self
            .state
            .jwt
            .generate_token_pair(id, "admin@example.com", vec!["admin".to_string()])
            .unwrap()
            .access_token;
        account
    }

    /// Published grammar lesson with one 5-point question. Returns the lesson,
    /// question and correct option ids.
    async fn lesson_with_question(&self, admin: &Account, is_premium: bool) -> (Uuid, Uuid, Uuid) {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/bai-hoc",
                Some(&admin.access),
                Some(json!({
                    "title": "Part 5: Từ loại",
                    "lesson_type": "grammar",
                    "toeic_part": 5,
                    "is_premium": is_premium
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let lesson_id: Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

        let (status, body) = self
            .send(
                Method::POST,
                &format!("/api/bai-hoc/{lesson_id}/cau-hoi"),
                Some(&admin.access),
                Some(json!({
                    "content": "The manager gave a very ------- presentation.",
                    "points": 5,
                    "options": [
                        { "label": "A", "content": "impress" },
                        { "label": "B", "content": "impressive", "is_correct": true },
                        { "label": "C", "content": "impression" }
                    ]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let data = &body["data"];
        let question_id: Uuid = data["question"]["id"].as_str().unwrap().parse().unwrap();
        let correct = data["options"]
            .as_array()
            .unwrap()
            .iter()
            .find(|o| o["is_correct"] == true)
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        (lesson_id, question_id, correct)
    }
}

macro_rules! test_app {
    () => {
        match TestApp::connect() {
            Some(app) => app,
            None => {
                eprintln!("TEST_DATABASE_URL not set, skipping");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let app = test_app!();
    let email = format!("Trung-{}@Example.com", Uuid::new_v4().simple());
    let body = json!({ "email": email, "password": "matkhau123", "full_name": "Trần Trung" });

    let (status, _) = app.send(Method::POST, "/api/auth/dang-ky", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut again = body;
    again["email"] = json!(email.to_lowercase());
    let (status, body) = app.send(Method::POST, "/api/auth/dang-ky", None, Some(again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_refresh_token_exchanges_once() {
    let app = test_app!();
    let account = app.register("Lê Lan").await;
    let body = json!({ "refresh_token": account.refresh });

    let (first, second) = tokio::join!(
        app.send(Method::POST, "/api/auth/lam-moi", None, Some(body.clone())),
        app.send(Method::POST, "/api/auth/lam-moi", None, Some(body.clone())),
    );
    let statuses = [first.0, second.0];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::UNAUTHORIZED).count(),
        1
    );

    let (status, _) = app.send(Method::POST, "/api/auth/lam-moi", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_repeated_submission_counts_attempts() {
    let app = test_app!();
    let admin = app.admin().await;
    let (lesson_id, question_id, correct) = app.lesson_with_question(&admin, false).await;
    let student = app.register("Nguyễn Hoa").await;
    let submit = format!("/api/bai-hoc/{lesson_id}/nop-bai");

    let (status, first) = app
        .send(
            Method::POST,
            &submit,
            Some(&student.access),
            Some(json!({ "answers": [{ "question_id": question_id, "option_id": null }] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["data"]["result"]["attempt_number"], 1);
    assert_eq!(first["data"]["result"]["percentage"], 0.0);
    assert_eq!(first["data"]["progress"]["status"], "in_progress");
    assert_eq!(first["data"]["progress"]["attempts"], 1);

    let (status, second) = app
        .send(
            Method::POST,
            &submit,
            Some(&student.access),
            Some(json!({ "answers": [{ "question_id": question_id, "option_id": correct }] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{second}");
    assert_eq!(second["data"]["result"]["attempt_number"], 2);
    assert_eq!(second["data"]["result"]["score"], 5);
    assert_eq!(second["data"]["percentage_text"], "100%");
    assert_eq!(second["data"]["progress"]["status"], "completed");
    assert_eq!(second["data"]["progress"]["attempts"], 2);
    assert_eq!(second["data"]["progress"]["best_percentage"], 100.0);

    let (_, progress) = app.send(Method::GET, "/api/tien-do", Some(&student.access), None).await;
    let rows = progress["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["attempts"], 2);
}

#[tokio::test]
async fn test_concurrent_first_submissions_get_distinct_attempts() {
    let app = test_app!();
    let admin = app.admin().await;
    let (lesson_id, question_id, correct) = app.lesson_with_question(&admin, false).await;
    let student = app.register("Phạm Minh").await;
    let submit = format!("/api/bai-hoc/{lesson_id}/nop-bai");
    let body = json!({ "answers": [{ "question_id": question_id, "option_id": correct }] });

    let (first, second) = tokio::join!(
        app.send(Method::POST, &submit, Some(&student.access), Some(body.clone())),
        app.send(Method::POST, &submit, Some(&student.access), Some(body.clone())),
    );
    assert_eq!(first.0, StatusCode::OK, "{}", first.1);
    assert_eq!(second.0, StatusCode::OK, "{}", second.1);

    let mut attempts = [
        first.1["data"]["result"]["attempt_number"].as_i64().unwrap(),
        second.1["data"]["result"]["attempt_number"].as_i64().unwrap(),
    ];
    attempts.sort_unstable();
    assert_eq!(attempts, [1, 2]);
}

#[tokio::test]
async fn test_premium_lesson_is_locked_for_students() {
    let app = test_app!();
    let admin = app.admin().await;
    let (lesson_id, question_id, correct) = app.lesson_with_question(&admin, true).await;
    let student = app.register("Võ Thảo").await;

    let (status, body) = app
        .send(Method::GET, &format!("/api/bai-hoc/{lesson_id}"), Some(&student.access), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/bai-hoc/{lesson_id}/nop-bai"),
            Some(&student.access),
            Some(json!({ "answers": [{ "question_id": question_id, "option_id": correct }] })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::GET, &format!("/api/bai-hoc/{lesson_id}"), Some(&admin.access), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_demoted_admin_token_is_refused() {
    let app = test_app!();
    let student = app.register("Đỗ Nam").await;
    let stale_admin = app
        .state
        .jwt
        .generate_token_pair(student.id, "nam@example.com", vec!["admin".to_string()])
        .unwrap()
        .access_token;

    let (status, _) = app.send(Method::GET, "/api/nguoi-dung", Some(&stale_admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_search_matches_wildcards_literally() {
    let app = test_app!();
    let admin = app.admin().await;
    let tag = Uuid::new_v4().simple().to_string();
    app.register(&format!("Hoàng {tag}")).await;

    let (status, body) = app
        .send(Method::GET, &format!("/api/nguoi-dung?search={tag}"), Some(&admin.access), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let wildcard = format!("_{}", &tag[1..]);
    let (status, body) = app
        .send(Method::GET, &format!("/api/nguoi-dung?search={wildcard}"), Some(&admin.access), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[cfg(feature = "schedules")]
#[tokio::test]
async fn test_submission_completes_due_schedule() {
    let app = test_app!();
    let admin = app.admin().await;
    let (lesson_id, question_id, correct) = app.lesson_with_question(&admin, false).await;
    let student = app.register("Bùi An").await;
    let today = chrono::Utc::now().date_naive();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/lich-hoc",
            Some(&student.access),
            Some(json!({ "lesson_id": lesson_id, "scheduled_date": today })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/bai-hoc/{lesson_id}/nop-bai"),
            Some(&student.access),
            Some(json!({ "answers": [{ "question_id": question_id, "option_id": correct }] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["schedules_completed"], 1);

    let (_, body) = app.send(Method::GET, "/api/lich-hoc", Some(&student.access), None).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["is_completed"], true);
}

#[cfg(feature = "schedules")]
#[tokio::test]
async fn test_unregister_removes_pending_schedules() {
    let app = test_app!();
    let admin = app.admin().await;
    let (first, ..) = app.lesson_with_question(&admin, false).await;
    let (second, ..) = app.lesson_with_question(&admin, false).await;
    let student = app.register("Đặng Vy").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/lo-trinh",
            Some(&admin.access),
            Some(json!({ "title": "Mục tiêu 600", "target_score": 600, "lesson_ids": [first, second] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let roadmap_id = body["data"]["id"].as_str().unwrap().to_string();
    let registration = format!("/api/lo-trinh/{roadmap_id}/dang-ky");

    let (status, _) = app.send(Method::POST, &registration, Some(&student.access), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.send(Method::POST, &registration, Some(&student.access), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/lich-hoc/tu-dong",
            Some(&student.access),
            Some(json!({ "roadmap_id": roadmap_id, "rest_days": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["schedules"].as_array().unwrap().len(), 2);

    let (status, body) = app.send(Method::DELETE, &registration, Some(&student.access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["schedules_removed"], 2);

    let (_, body) = app.send(Method::GET, "/api/lich-hoc", Some(&student.access), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = app.send(Method::DELETE, &registration, Some(&student.access), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
