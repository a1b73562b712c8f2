//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 라우트 핸들러(routes/)에서 이 모듈의 함수를 호출하여 DB 작업을 수행합니다.
//!
//! 각 하위 모듈:
//! - `attendance`: 일별 출결 스냅샷 저장/조회/삭제
//! - `roster`: 분반 학생 명단 조회와 통째 교체
//! - `sections`: 학년별 분반 CRUD
//! - `users`: 관리자 계정 조회

pub mod attendance;
pub mod roster;
pub mod sections;
pub mod users;

// `crate::db::list_students`처럼 바로 접근할 수 있게 합니다.
// users는 `db::users as db_users`로 가져다 씁니다.
pub use attendance::*;
pub use roster::*;
pub use sections::*;

use sqlx::SqlitePool;

/// 아직 적용되지 않은 마이그레이션을 순서대로 실행합니다.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// 테스트용 인메모리 DB. 연결마다 별개의 DB가 되므로 연결은 하나만 씁니다.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}
