//! # 전체 통계 라우트 핸들러
//!
//! 인증 없이 읽을 수 있습니다.

use crate::{db, error::AppError, routes::AppState, services::report::compute_global_summary};
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// `GET /api/stats/summary`: 저장된 모든 스냅샷의 상태별 평균.
/// 스냅샷이 하나도 없으면 `{}`.
pub async fn summary(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let snapshots = db::list_all_snapshots(&state.pool).await?;

    let body = match compute_global_summary(&snapshots) {
        Some(summary) => json!(summary),
        None => json!({}),
    };

    Ok(Json(body))
}
