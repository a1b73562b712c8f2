//! # 비즈니스 로직 서비스
//!
//! DB와 HTTP에 의존하지 않는 순수 로직을 모아둔 모듈입니다.
//! - `import`: 업로드 검증, 헤더 별칭 해석, 행 → 명단 변환
//! - `report`: 하루치 요약, 학생별 이력, 전체 평균 집계
//! - `sheet`: CSV / 엑셀 파일 파싱

pub mod import;
pub mod report;
pub mod sheet;
