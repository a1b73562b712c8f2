//! # 인증(Authentication) 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 인증 | 설명 |
//! |--------|------|--------|------|------|
//! | POST | /api/auth/login | `login` | - | 아이디/비밀번호 확인 후 JWT 발급 |
//! | GET | /api/auth/me | `me` | 토큰 | 현재 로그인한 계정 정보 |
//!
//! 회원가입은 없습니다. 관리자 계정은 시작 시 시드로만 만들어집니다.

use crate::{
    bootstrap::hash_password,
    db::users as db_users,
    error::AppError,
    middleware::auth::{create_access_token, AuthUser},
    models::user::*,
    routes::{extract::ApiJson, AppState},
};
use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use axum::{extract::State, Json};
use std::sync::OnceLock;

/// 없는 사용자와 틀린 비밀번호에 똑같이 쓰는 메시지
const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn rejected() -> AppError {
    AppError::Forbidden(INVALID_CREDENTIALS.to_string())
}

/// 없는 사용자일 때 대신 검증할 해시. 처음 쓸 때 한 번만 만듭니다.
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH
        .get_or_init(|| hash_password("rollcall-unknown-user").ok())
        .as_deref()
}

/// 없는 사용자도 Argon2 검증 한 번을 똑같이 거치게 합니다.
/// 응답 시간으로 계정 존재 여부를 알 수 없어야 합니다. 결과는 버립니다.
fn burn_password_check(password: &str) {
    if let Some(parsed) = dummy_hash().and_then(|hash| PasswordHash::new(hash).ok()) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
    }
}

/// `POST /api/auth/login` → `{ token, username, role }`
///
/// ## 처리 흐름
/// 1. 빈 아이디/비밀번호는 400
/// 2. 사용자 조회 (없으면 더미 해시로 검증 한 번 후 403)
/// 3. Argon2 비밀번호 검증 (틀리면 403)
/// 4. 24시간짜리 액세스 토큰 발급
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest("Username and password are required".to_string()));
    }

    let Some(user) = db_users::find_by_username(&state.pool, req.username.trim()).await? else {
        burn_password_check(&req.password);
        tracing::warn!(username = %req.username, "login rejected: unknown user");
        return Err(rejected());
    };

    // 비밀번호 검증
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password hash parse error: {}", e)))?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        tracing::warn!(username = %user.username, "login rejected: wrong password");
        return Err(rejected());
    }

    // 토큰 발급
    let token = create_access_token(&user, &state.jwt_secret)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    tracing::info!(username = %user.username, "admin logged in");

    Ok(Json(AuthResponse {
        token,
        username: user.username,
        role: user.role,
    }))
}

/// `GET /api/auth/me`: 토큰의 사용자 ID로 계정을 다시 읽습니다.
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = db_users::find_by_id(&state.pool, &auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_hash_is_a_real_argon2_hash() {
        let hash = dummy_hash().unwrap();
        let parsed = PasswordHash::new(hash).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");

        for password in ["admin123", "password", ""] {
            assert!(Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_err());
        }
        // 두 번째 호출은 같은 값
        assert_eq!(dummy_hash(), Some(hash));
    }
}
