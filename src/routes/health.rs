//! # 헬스체크(Health Check) 핸들러
//!
//! ## 엔드포인트
//! - `GET /health` → `{ "status": "ok", "timestamp": "..." }`
//!
//! 로드밸런서나 컨테이너 헬스체크에서 사용합니다.
//! DB 연결 여부와 관계없이 항상 200을 돌려줍니다.

use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// `GET /health`: 서버 상태와 현재 시각을 돌려줍니다.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339()
    }))
}
