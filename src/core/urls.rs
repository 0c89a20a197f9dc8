#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    pub const HEALTH: &'static str = "/health";
    pub const API_HEALTH: &'static str = "/api/health";

    // Auth
    pub const AUTH_REGISTER: &'static str = "/api/auth/dang-ky";
    pub const AUTH_LOGIN: &'static str = "/api/auth/dang-nhap";
    pub const AUTH_REFRESH: &'static str = "/api/auth/lam-moi";
    pub const AUTH_LOGOUT: &'static str = "/api/auth/dang-xuat";
    pub const AUTH_ME: &'static str = "/api/auth/toi";

    // Users
    pub const USERS: &'static str = "/api/nguoi-dung";
    pub const USER_PROFILE: &'static str = "/api/nguoi-dung/ho-so";
    pub const USER_PASSWORD: &'static str = "/api/nguoi-dung/mat-khau";

    // Lessons and passages
    pub const LESSONS: &'static str = "/api/bai-hoc";
    pub const LESSON_BY_ID: &'static str = "/api/bai-hoc/:id";
    pub const LESSON_READINGS: &'static str = "/api/bai-hoc/:id/bai-doc";
    pub const LESSON_LISTENINGS: &'static str = "/api/bai-hoc/:id/bai-nghe";
    pub const LESSON_QUESTIONS: &'static str = "/api/bai-hoc/:id/cau-hoi";
    pub const READING_BY_ID: &'static str = "/api/bai-doc/:id";
    pub const LISTENING_BY_ID: &'static str = "/api/bai-nghe/:id";

    // Exercises
    pub const LESSON_SUBMIT: &'static str = "/api/bai-hoc/:id/nop-bai";
    pub const RESULTS: &'static str = "/api/ket-qua";
    pub const RESULT_BY_ID: &'static str = "/api/ket-qua/:id";

    // Progress
    pub const PROGRESS: &'static str = "/api/tien-do";
    pub const PROGRESS_DASHBOARD: &'static str = "/api/tien-do/tong-quan";

    // Roadmaps
    pub const ROADMAPS: &'static str = "/api/lo-trinh";
    pub const ROADMAPS_MINE: &'static str = "/api/lo-trinh/cua-toi";
    pub const ROADMAP_BY_ID: &'static str = "/api/lo-trinh/:id";
    pub const ROADMAP_REGISTRATION: &'static str = "/api/lo-trinh/:id/dang-ky";

    // Schedules
    pub const SCHEDULES: &'static str = "/api/lich-hoc";
    pub const SCHEDULE_BY_ID: &'static str = "/api/lich-hoc/:id";
    pub const SCHEDULE_GENERATE: &'static str = "/api/lich-hoc/tu-dong";

    // Assessment
    pub const ASSESSMENT_RESULT: &'static str = "/api/danh-gia/ket-qua/:id";
    pub const ASSESSMENT_OVERVIEW: &'static str = "/api/danh-gia/tong-quan";
}
