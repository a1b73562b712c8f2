//! # 분반(Section) 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | GET | /api/sections/{year} | `list_sections` | 분반 이름 목록 (이름순) |
//! | POST | /api/sections/{year} | `create_section` | 새 분반 생성 |
//! | DELETE | /api/sections/{year}/{section} | `delete_section` | 분반과 소속 학생 삭제 |
//!
//! 모두 관리자 토큰이 필요합니다. 분반 이름은 앞뒤 공백을 지우고 대문자로 저장합니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::{
        extract::{ApiJson, ApiPath},
        parse_year, AppState,
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

/// `GET /api/sections/{year}` → `{ "sections": ["A", "B"] }`
pub async fn list_sections(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiPath(year): ApiPath<String>,
) -> Result<Json<Value>, AppError> {
    let year = parse_year(&year)?;
    let names: Vec<String> = db::list_sections(&state.pool, year)
        .await?
        .into_iter()
        .map(|s| s.name)
        .collect();

    Ok(Json(json!({ "sections": names })))
}

/// `POST /api/sections/{year}` + `{ "section": "c" }` → `201 { "success": true, "section": "C" }`
///
/// 이름이 비어 있으면 400, 이미 있으면 409.
pub async fn create_section(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(year): ApiPath<String>,
    ApiJson(req): ApiJson<CreateSectionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let year = parse_year(&year)?;
    let name = normalize_section(req.section.as_deref().unwrap_or_default());
    if name.is_empty() {
        return Err(AppError::BadRequest("Section name is required".to_string()));
    }

    // 먼저 확인해 친절한 메시지로 409. 동시에 만들어져도 PK 위반이 409가 됩니다
    if db::find_section(&state.pool, year, &name).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Section \"{}\" already exists for {}",
            name, year
        )));
    }

    let section = db::create_section(&state.pool, year, &name).await?;
    tracing::info!(year = %year, section = %section.name, by = %auth_user.username, "section created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "section": section.name })),
    ))
}

/// `DELETE /api/sections/{year}/{section}` → `{ "success": true, "deleted_students": n }`
///
/// 분반이 없어도 성공으로 응답합니다 (삭제된 학생 0명).
pub async fn delete_section(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath((year, section)): ApiPath<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let year = parse_year(&year)?;
    let name = normalize_section(&section);

    let (removed, deleted_students) = db::delete_section(&state.pool, year, &name).await?;
    tracing::info!(
        year = %year,
        section = %name,
        removed,
        deleted_students,
        by = %auth_user.username,
        "section deleted"
    );

    Ok(Json(json!({ "success": true, "deleted_students": deleted_students })))
}
