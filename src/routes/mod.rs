//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들과, 이를 한데 묶는 `router()`를 둡니다.
//!
//! 각 하위 모듈:
//! - `auth`: 로그인, 내 정보
//! - `sections`: 학년별 분반 목록/생성/삭제
//! - `students`: 분반 명단 조회, 엑셀/CSV 업로드, 예전 형식 변환, 전체 삭제
//! - `attendance`: 출결 저장/미리보기/이력/학생별 통계/삭제
//! - `stats`: 전체 평균 통계
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `extract`: 거부를 JSON 에러로 바꾸는 추출기 래퍼

pub mod attendance;
pub mod auth;
pub mod extract;
pub mod health;
pub mod sections;
pub mod stats;
pub mod students;

use crate::error::AppError;
use crate::models::CohortYear;
use crate::services::import::MAX_UPLOAD_BYTES;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use sqlx::SqlitePool;

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// JWT 토큰 서명용 비밀키
    pub jwt_secret: String,
    /// `GET /api/attendance`에서 `limit`이 없을 때 쓰는 기본값
    pub history_limit: i64,
}

/// 업로드 라우트의 요청 본문 한도.
/// multipart 경계와 헤더를 감안해 파일 한도보다 넉넉히 둡니다.
/// 실제 5 MiB 검사는 `validate_upload()`가 하고 400을 돌려줍니다.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES * 2;

/// 전체 라우터를 만듭니다. `/health`를 제외한 모든 경로는 `/api` 아래에 있습니다.
///
/// 토큰이 필요한 핸들러는 `AuthUser` 추출기를 매개변수로 받습니다.
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route(
            "/sections/{year}",
            get(sections::list_sections).post(sections::create_section),
        )
        .route("/sections/{year}/{section}", delete(sections::delete_section))
        .route("/students/{year}/{section}", get(students::list_students))
        .route(
            "/students/{year}/{section}/upload",
            post(students::upload_roster).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/students/{year}/{section}/legacy", post(students::migrate_legacy))
        .route("/students/{year}/{section}/all", delete(students::clear_roster))
        .route(
            "/attendance",
            get(attendance::list_history).post(attendance::save_attendance),
        )
        .route("/attendance/preview", post(attendance::preview_attendance))
        .route("/attendance/student", get(attendance::student_history))
        .route("/attendance/date/{date}", get(attendance::get_by_date))
        .route("/attendance/{id}", delete(attendance::delete_attendance))
        .route("/stats/summary", get(stats::summary));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health::health_check))
        .with_state(state)
}

/// 경로의 학년 문자열(`second-year` 등)을 해석합니다.
pub(crate) fn parse_year(raw: &str) -> Result<CohortYear, AppError> {
    raw.parse().map_err(AppError::BadRequest)
}
