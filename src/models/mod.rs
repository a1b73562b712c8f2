//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `attendance`: 출결 상태, 일별 스냅샷, 학생별 이력 통계
//! - `roster`: 학년(cohort), 분반(section), 학생 명단
//! - `user`: 관리자 계정과 로그인 요청/응답

pub mod attendance;
pub mod roster;
pub mod user;

pub use attendance::*;
pub use roster::*;
pub use user::*;
