//! # JWT 인증 추출기
//!
//! 핸들러 매개변수에 `AuthUser`를 넣으면 그 라우트는 토큰이 필요해집니다.
//! - 헤더 없음 → 401 `auth_required`
//! - `Bearer ` 아님, 서명 불일치, 만료 → 403 `auth_rejected`

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::User, routes::AppState};

/// 로그인 토큰 유효 시간 (하루)
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// 검증된 토큰에서 꺼낸 요청자 정보
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?
            .trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        // 서명과 exp를 함께 검사합니다
        let claims = verify_access_token(token, &state.jwt_secret)?;

        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}

/// 토큰이 없으면 401, 틀렸거나 만료되었으면 403
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => {
                AppError::Unauthorized("Access token required".to_string())
            }
            AuthError::InvalidToken => {
                AppError::Forbidden("Invalid authorization token".to_string())
            }
            AuthError::ExpiredToken => {
                AppError::Forbidden("Authorization token has expired".to_string())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(?self, "rejected request token");
        AppError::from(self).into_response()
    }
}

pub fn create_access_token(user: &User, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    issue_token(&user.id, &user.username, &user.role, secret, Utc::now())
}

/// 발급 시각을 받아 토큰을 만듭니다. 테스트에서 과거 시각으로 만료 토큰을 만들 때도 씁니다.
pub fn issue_token(
    user_id: &str,
    username: &str,
    role: &str,
    secret: &str,
    issued_at: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role: role.to_string(),
        iat: issued_at.timestamp(),
        exp: (issued_at + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// HS256 서명 검증. 만료만 `ExpiredToken`으로 구분하고 나머지는 모두 `InvalidToken`.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_token_verifies_and_carries_identity() {
        let token = issue_token("u1", "admin", "admin", SECRET, Utc::now()).unwrap();
        let claims = verify_access_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn token_from_two_days_ago_is_expired() {
        let token = issue_token("u1", "admin", "admin", SECRET, Utc::now() - Duration::days(2)).unwrap();
        assert_eq!(verify_access_token(&token, SECRET), Err(AuthError::ExpiredToken));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let token = issue_token("u1", "admin", "admin", "other", Utc::now()).unwrap();
        assert_eq!(verify_access_token(&token, SECRET), Err(AuthError::InvalidToken));
        assert_eq!(verify_access_token("garbage", SECRET), Err(AuthError::InvalidToken));
    }

    #[test]
    fn missing_and_rejected_tokens_map_to_distinct_kinds() {
        assert_eq!(AppError::from(AuthError::MissingToken).kind(), "auth_required");
        assert_eq!(AppError::from(AuthError::InvalidToken).kind(), "auth_rejected");
        assert_eq!(AppError::from(AuthError::ExpiredToken).kind(), "auth_rejected");
    }
}
