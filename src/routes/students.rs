//! # 학생 명단 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | GET | /api/students/{year}/{section} | `list_students` | 분반 명단 (순번순) |
//! | POST | /api/students/{year}/{section}/upload | `upload_roster` | 엑셀/CSV로 명단 교체 |
//! | POST | /api/students/{year}/{section}/legacy | `migrate_legacy` | 예전 형식 레코드로 명단 교체 |
//! | DELETE | /api/students/{year}/{section}/all | `clear_roster` | 분반 학생 전체 삭제 |
//!
//! 업로드와 변환은 병합이 아니라 교체입니다. 기존 학생은 모두 지워집니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::{
        extract::{ApiJson, ApiPath},
        parse_year, AppState,
    },
    services::{
        import::{assign_sequence_numbers, rows_to_entries, validate_upload},
        sheet::parse_rows,
    },
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde_json::{json, Value};

/// 명단 조회에서 쓸 수 없는 분반 이름
const RESERVED_SECTION: &str = "ALL";

/// `GET /api/students/{year}/{section}` → `{ "students": [...] }`
pub async fn list_students(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiPath((year, section)): ApiPath<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let year = parse_year(&year)?;
    let section = normalize_section(&section);
    if section.is_empty() || section == RESERVED_SECTION {
        return Err(AppError::BadRequest("Invalid section name".to_string()));
    }

    let students = db::list_students(&state.pool, year, &section).await?;
    Ok(Json(json!({ "students": students })))
}

/// `POST /api/students/{year}/{section}/upload` (multipart, 필드 이름 `file`)
///
/// ## 처리 흐름
/// 1. `file` 필드를 찾고 Content-Type과 크기 검사
/// 2. 첫 시트(또는 CSV)를 행 목록으로 파싱
/// 3. 학년별 헤더 별칭으로 명단 항목 변환
/// 4. 한 트랜잭션에서 기존 명단을 지우고 새 명단 삽입
///
/// → `{ "message": "...", "count": n }` (n = 파싱된 행 수)
pub async fn upload_roster(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath((year, section)): ApiPath<(String, String)>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    // multipart가 아닌 요청도 JSON 400으로 응답
    let mut multipart = multipart?;
    let year = parse_year(&year)?;
    let section = normalize_section(&section);
    if section.is_empty() {
        return Err(AppError::BadRequest("Section name is required".to_string()));
    }

    // `file` 필드만 읽고 나머지 필드는 건너뜁니다
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Could not read uploaded file: {}", e)))?;
        upload = Some((content_type, bytes));
        break;
    }

    let Some((content_type, bytes)) = upload else {
        return Err(AppError::BadRequest("No file uploaded".to_string()));
    };

    // 검사는 파싱 전에. 형식이나 크기가 틀리면 파일 내용은 보지 않습니다
    let format = validate_upload(content_type.as_deref(), bytes.len()).inspect_err(|e| {
        tracing::warn!(year = %year, section = %section, "upload rejected: {}", e);
    })?;
    let rows = parse_rows(&bytes, format)?;
    let entries = rows_to_entries(&rows, year);

    // 한 트랜잭션으로 교체. 실패하면 이전 명단이 그대로 남습니다
    let count = db::replace_section_roster(&state.pool, year, &section, &entries).await?;
    tracing::info!(
        year = %year,
        section = %section,
        count,
        by = %auth_user.username,
        "roster imported"
    );

    Ok(Json(json!({
        "message": format!("Students uploaded to {} Section {}", year, section),
        "count": count
    })))
}

/// `POST /api/students/{year}/{section}/legacy` + 예전 형식 레코드 배열
///
/// 1학년 `studentName / rollNumber / registerNo`, 그 외 `name / rollNo / regNo`
/// 두 형식을 모두 받아 통합 형식으로 바꾼 뒤 명단을 교체합니다.
pub async fn migrate_legacy(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath((year, section)): ApiPath<(String, String)>,
    ApiJson(records): ApiJson<Vec<LegacyStudent>>,
) -> Result<Json<Value>, AppError> {
    let year = parse_year(&year)?;
    let section = normalize_section(&section);
    if section.is_empty() {
        return Err(AppError::BadRequest("Section name is required".to_string()));
    }

    // 순번이 없거나 겹치는 레코드는 업로드와 같은 규칙으로 빈 번호를 받습니다
    let explicit: Vec<Option<i64>> = records.iter().map(LegacyStudent::sequence).collect();
    let entries: Vec<NewRosterEntry> = records
        .into_iter()
        .zip(assign_sequence_numbers(&explicit))
        .map(|(record, sequence_number)| record.into_entry(sequence_number))
        .collect();

    let count = db::replace_section_roster(&state.pool, year, &section, &entries).await?;
    tracing::info!(
        year = %year,
        section = %section,
        count,
        by = %auth_user.username,
        "legacy roster migrated"
    );

    Ok(Json(json!({
        "message": format!("Legacy students migrated to {} Section {}", year, section),
        "count": count
    })))
}

/// `DELETE /api/students/{year}/{section}/all` → `{ "message": "...", "deleted_count": n }`
pub async fn clear_roster(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath((year, section)): ApiPath<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let year = parse_year(&year)?;
    let section = normalize_section(&section);

    let deleted_count = db::delete_students(&state.pool, year, &section).await?;
    tracing::info!(
        year = %year,
        section = %section,
        deleted_count,
        by = %auth_user.username,
        "roster cleared"
    );

    Ok(Json(json!({
        "message": format!("Deleted all students from {} Section {}", year, section),
        "deleted_count": deleted_count
    })))
}
