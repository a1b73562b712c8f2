//! # 출결(Attendance) 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 인증 | 설명 |
//! |--------|------|--------|------|------|
//! | GET | /api/attendance | `list_history` | - | 날짜 내림차순 이력 |
//! | POST | /api/attendance | `save_attendance` | 토큰 | 하루치 출결 계산 후 저장 |
//! | POST | /api/attendance/preview | `preview_attendance` | 토큰 | 저장 없이 계산만 |
//! | GET | /api/attendance/student | `student_history` | - | 학생 한 명의 통계 |
//! | GET | /api/attendance/date/{date} | `get_by_date` | - | 특정 날짜의 스냅샷 |
//! | DELETE | /api/attendance/{id} | `delete_attendance` | 토큰 | 스냅샷 삭제 |
//!
//! 같은 날짜를 두 번 저장하면 409(`duplicate_key`)입니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::{
        extract::{ApiJson, ApiPath, ApiQuery},
        parse_year, AppState,
    },
    services::report::{compute_daily_summary, find_student_history},
};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};

/// 요청의 학년/분반으로 명단을 읽어 하루치 요약을 계산합니다.
async fn summarize(
    state: &AppState,
    req: &SaveAttendanceRequest,
) -> Result<(CohortYear, String, DailySummary), AppError> {
    let year = parse_year(&req.year)?;
    let section = normalize_section(&req.section);
    if section.is_empty() {
        return Err(AppError::BadRequest("Section name is required".to_string()));
    }

    // 명단이 비어 있으면 요약할 대상이 없습니다
    let roster = db::list_students(&state.pool, year, &section).await?;
    if roster.is_empty() {
        return Err(AppError::NotFound(format!(
            "No students found for {} Section {}",
            year, section
        )));
    }

    // 날짜를 안 보내면 오늘 (UTC)
    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());
    let label = format!("{} {}", year.label(), section);
    let summary = compute_daily_summary(&req.markings, &roster, date, &label);

    Ok((year, section, summary))
}

/// `GET /api/attendance?start_date=&end_date=&limit=` → 스냅샷 배열
///
/// `limit`이 없거나 0 이하이면 설정의 기본값을 씁니다.
pub async fn list_history(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<Vec<DailySnapshot>>, AppError> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(AppError::BadRequest(
                "start_date must not be after end_date".to_string(),
            ));
        }
    }

    let limit = query
        .limit
        .filter(|l| *l > 0)
        .unwrap_or(state.history_limit);
    let snapshots = db::list_snapshots(&state.pool, query.start_date, query.end_date, limit).await?;

    Ok(Json(snapshots))
}

/// `POST /api/attendance` → `201` + 저장된 스냅샷
pub async fn save_attendance(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(req): ApiJson<SaveAttendanceRequest>,
) -> Result<(StatusCode, Json<DailySnapshot>), AppError> {
    let (year, section, summary) = summarize(&state, &req).await?;

    // UUIDv7: 시간순 정렬되는 ID
    let id = uuid::Uuid::now_v7().to_string();
    let snapshot = db::insert_snapshot(&state.pool, &id, year, &section, &summary)
        .await
        .map_err(|e| {
            // 같은 날짜의 UNIQUE 위반은 안내 문구를 바꿔 409로
            if e.is_duplicate_key() {
                AppError::Conflict(format!(
                    "Attendance for {} has already been saved",
                    summary.date
                ))
            } else {
                e
            }
        })?;

    tracing::info!(
        date = %snapshot.date,
        year = %year,
        section = %section,
        present = snapshot.present_count,
        total = snapshot.total_students,
        by = %auth_user.username,
        "attendance saved"
    );

    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// `POST /api/attendance/preview` → 저장하지 않은 요약 (요약문 미리보기용)
pub async fn preview_attendance(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiJson(req): ApiJson<SaveAttendanceRequest>,
) -> Result<Json<DailySummary>, AppError> {
    let (_, _, summary) = summarize(&state, &req).await?;
    Ok(Json(summary))
}

/// `GET /api/attendance/student?name=&roll_no=` → `{ student_info, statistics }`
pub async fn student_history(
    State(state): State<AppState>,
    ApiQuery(matcher): ApiQuery<StudentMatcher>,
) -> Result<Json<StudentHistory>, AppError> {
    // 최신 날짜부터 받아야 이력도 최신순이 됩니다
    let snapshots = db::list_all_snapshots(&state.pool).await?;
    let history = find_student_history(&snapshots, &matcher)?;
    Ok(Json(history))
}

/// `GET /api/attendance/date/{date}` (`YYYY-MM-DD`)
pub async fn get_by_date(
    State(state): State<AppState>,
    ApiPath(date): ApiPath<String>,
) -> Result<Json<DailySnapshot>, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date \"{}\", expected YYYY-MM-DD", date)))?;

    let snapshot = db::find_by_date(&state.pool, date)
        .await?
        .ok_or(AppError::NotFound("No record found for this date".to_string()))?;

    Ok(Json(snapshot))
}

/// `DELETE /api/attendance/{id}`
pub async fn delete_attendance(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>, AppError> {
    if !db::delete_snapshot(&state.pool, &id).await? {
        return Err(AppError::NotFound("Record not found".to_string()));
    }
    tracing::info!(id = %id, by = %auth_user.username, "attendance deleted");

    Ok(Json(json!({ "message": "Record deleted successfully" })))
}
