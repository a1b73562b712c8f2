//! # rollcall
//!
//! 학생 출결(출석/결석/휴가/공가/지각)을 기록하고 날짜별·학생별 이력을 조회하는 서버.
//!
//! `main.rs`는 설정을 읽고 서버를 띄우기만 합니다.
//! 라우터와 나머지 모듈은 통합 테스트(tests/)에서도 쓰도록 라이브러리로 공개합니다.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
