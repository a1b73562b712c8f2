//! # 분반(Section) 데이터베이스 쿼리 모듈
//!
//! `sections` 테이블은 (year, name) 복합키를 가집니다.
//! 분반을 지우면 같은 (year, name)의 학생도 함께 지웁니다.

use crate::error::AppError;
use crate::models::*;
use sqlx::SqlitePool;

/// 학년의 분반 목록을 이름순으로 조회합니다.
pub async fn list_sections(pool: &SqlitePool, year: CohortYear) -> Result<Vec<Section>, AppError> {
    let sections = sqlx::query_as::<_, Section>(
        "SELECT year, name, created_at FROM sections WHERE year = ? ORDER BY name",
    )
    .bind(year.as_str())
    .fetch_all(pool)
    .await?;

    Ok(sections)
}

/// (학년, 이름)으로 분반 하나를 조회합니다.
///
/// `fetch_optional`: 0행이면 None. 존재 여부 확인용이라 `fetch_one` 대신 씁니다.
pub async fn find_section(
    pool: &SqlitePool,
    year: CohortYear,
    name: &str,
) -> Result<Option<Section>, AppError> {
    let section = sqlx::query_as::<_, Section>(
        "SELECT year, name, created_at FROM sections WHERE year = ? AND name = ?",
    )
    .bind(year.as_str())
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(section)
}

/// 새 분반을 만듭니다. 이미 있으면 고유키 위반으로 `duplicate_key` 응답이 됩니다.
pub async fn create_section(pool: &SqlitePool, year: CohortYear, name: &str) -> Result<Section, AppError> {
    sqlx::query("INSERT INTO sections (year, name) VALUES (?, ?)")
        .bind(year.as_str())
        .bind(name)
        .execute(pool)
        .await?;

    // 생성 직후 다시 조회해 DB 기본값(created_at)이 채워진 값을 돌려줍니다
    find_section(pool, year, name)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created section".to_string()))
}

/// 분반과 그 분반의 학생을 한 트랜잭션에서 삭제합니다.
///
/// ## 반환값
/// - `(분반 삭제 여부, 삭제된 학생 수)`
pub async fn delete_section(
    pool: &SqlitePool,
    year: CohortYear,
    name: &str,
) -> Result<(bool, u64), AppError> {
    // begin(): 트랜잭션 시작. commit() 전에 에러로 빠져나가면 drop 시 롤백됩니다
    let mut tx = pool.begin().await?;

    // `&mut *tx`: 풀 대신 트랜잭션 연결에서 실행
    let section = sqlx::query("DELETE FROM sections WHERE year = ? AND name = ?")
        .bind(year.as_str())
        .bind(name)
        .execute(&mut *tx)
        .await?;

    let students = sqlx::query("DELETE FROM students WHERE year = ? AND section = ?")
        .bind(year.as_str())
        .bind(name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok((section.rows_affected() > 0, students.rows_affected()))
}

pub async fn count_sections(pool: &SqlitePool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sections")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
