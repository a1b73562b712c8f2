//! # 요청 추출기(Extractor) 래퍼
//!
//! axum 기본 `Json` / `Query` / `Path`는 형식이 틀리면 평문 응답을 바로 돌려줍니다.
//! 아래 래퍼는 같은 추출을 하되 거부를 `AppError`로 바꿔서,
//! 잘못된 요청도 `{"error":{"kind":"validation_failure",...}}` 모양의 400이 되게 합니다.

use crate::error::AppError;
use axum::extract::{FromRequest, FromRequestParts};

/// JSON 본문. 파싱 실패, 필드 누락, Content-Type 누락은 모두 400.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// 쿼리스트링. 날짜나 숫자 형식이 틀리면 400.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// 경로 매개변수
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
