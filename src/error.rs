//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 `{ "error": { "kind", "message" } }` HTTP 응답으로 변환
//!
//! | variant | kind | HTTP |
//! |---------|------|------|
//! | `BadRequest` | `validation_failure` | 400 |
//! | `NotFound` | `not_found` | 404 |
//! | `Unauthorized` | `auth_required` | 401 |
//! | `Forbidden` | `auth_rejected` | 403 |
//! | `Conflict` | `duplicate_key` | 409 |
//! | `Internal` / `Database` / `Io` | `upstream_failure` | 500 |

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::MultipartRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 필수 필드 누락, 잘못된 형식 등 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 요청한 레코드를 찾을 수 없음 (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// 인증 토큰이 없음 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 토큰이 위조/만료되었거나 로그인 정보가 틀림 (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 고유 제약 위반. 예: 같은 날짜의 출결을 두 번 저장 (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류
    /// #[from]: sqlx 함수 결과에 `?`를 쓰면 자동으로 이 variant로 변환됩니다.
    /// 고유 인덱스 위반만은 응답 단계에서 409로 분류합니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 파일 입출력 오류 (HTTP 500)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// 고유 제약 위반인지 여부. 명시적 `Conflict`와 DB의 고유 인덱스 위반 모두 해당합니다.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            AppError::Conflict(_) => true,
            AppError::Database(e) => is_unique_violation(e),
            _ => false,
        }
    }

    /// 응답 본문의 `kind` 값
    pub fn kind(&self) -> &'static str {
        if self.is_duplicate_key() {
            return "duplicate_key";
        }
        match self {
            AppError::BadRequest(_) => "validation_failure",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "auth_required",
            AppError::Forbidden(_) => "auth_rejected",
            AppError::Conflict(_) => "duplicate_key",
            AppError::Internal(_) | AppError::Database(_) | AppError::Io(_) => "upstream_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        if self.is_duplicate_key() {
            return StatusCode::CONFLICT;
        }
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Database(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// sqlx 에러가 UNIQUE / PRIMARY KEY 제약 위반인지 확인합니다.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

// ── 추출기(Extractor) 거부 변환 ──
// axum 기본 추출기는 실패 시 평문 응답을 돌려줍니다.
// 여기서 AppError로 바꿔야 모든 에러가 같은 JSON 모양으로 나갑니다.
// 요청 형식 문제이므로 전부 400(`validation_failure`)입니다.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, IO, Internal)는 실제 에러 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let message = match self {
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg) => msg,
            AppError::Database(ref e) if is_unique_violation(e) => {
                tracing::warn!("Unique constraint violated: {}", e);
                "A record with the same key already exists".to_string()
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                "A database error occurred".to_string()
            }
            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                "An IO error occurred".to_string()
            }
        };

        // 결과: { "error": { "kind": "not_found", "message": "..." } }
        let body = Json(json!({
            "error": {
                "kind": kind,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
