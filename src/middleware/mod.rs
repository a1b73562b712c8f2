//! # 미들웨어 모듈
//!
//! - `auth`: Bearer 토큰 검증(`AuthUser` 추출자)과 JWT 발급

pub mod auth;
