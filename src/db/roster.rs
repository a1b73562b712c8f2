//! # 학생 명단 데이터베이스 쿼리 모듈
//!
//! 명단은 (year, section) 단위로만 바뀝니다.
//! 업로드는 병합이 아니라 교체입니다: 기존 학생을 모두 지운 뒤 새 목록을 넣습니다.

use crate::error::AppError;
use crate::models::*;
use sqlx::SqlitePool;

/// 분반 학생 목록을 순번 순서로 조회합니다.
pub async fn list_students(
    pool: &SqlitePool,
    year: CohortYear,
    section: &str,
) -> Result<Vec<RosterEntry>, AppError> {
    let students = sqlx::query_as::<_, RosterEntry>(
        r#"
        SELECT id, year, section, sequence_number, display_name,
               roll_number, register_number, department
        FROM students
        WHERE year = ? AND section = ?
        ORDER BY sequence_number
        "#,
    )
    .bind(year.as_str())
    .bind(section)
    .fetch_all(pool)
    .await?;

    Ok(students)
}

/// 분반 명단을 통째로 교체합니다.
///
/// ## 처리 흐름 (하나의 트랜잭션)
/// 1. 분반이 없으면 생성 (`INSERT OR IGNORE`)
/// 2. 해당 (year, section)의 기존 학생 전부 삭제
/// 3. 새 학생 목록 삽입
///
/// 중간에 실패하면 롤백되어 이전 명단이 그대로 남습니다.
/// 같은 순번이 두 번 나오면 고유 인덱스 위반으로 실패합니다.
pub async fn replace_section_roster(
    pool: &SqlitePool,
    year: CohortYear,
    section: &str,
    entries: &[NewRosterEntry],
) -> Result<usize, AppError> {
    let mut tx = pool.begin().await?;

    // 이미 있는 분반이면 아무 일도 하지 않습니다
    sqlx::query("INSERT OR IGNORE INTO sections (year, name) VALUES (?, ?)")
        .bind(year.as_str())
        .bind(section)
        .execute(&mut *tx)
        .await?;

    let removed = sqlx::query("DELETE FROM students WHERE year = ? AND section = ?")
        .bind(year.as_str())
        .bind(section)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    // 행마다 INSERT. 학생 id는 UUIDv7 (생성 순서대로 정렬됨)
    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO students (id, year, section, sequence_number, display_name,
                                  roll_number, register_number, department)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid::Uuid::now_v7().to_string())
        .bind(year.as_str())
        .bind(section)
        .bind(entry.sequence_number)
        .bind(&entry.display_name)
        .bind(&entry.roll_number)
        .bind(&entry.register_number)
        .bind(&entry.department)
        .execute(&mut *tx)
        .await?;
    }

    // 여기까지 성공해야 삭제와 삽입이 함께 반영됩니다
    tx.commit().await?;

    tracing::debug!(
        year = %year,
        section,
        removed,
        inserted = entries.len(),
        "replaced section roster"
    );

    Ok(entries.len())
}

/// 분반의 학생을 모두 삭제합니다. 분반 자체는 남깁니다.
pub async fn delete_students(pool: &SqlitePool, year: CohortYear, section: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM students WHERE year = ? AND section = ?")
        .bind(year.as_str())
        .bind(section)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// 시작 로그용 전체 학생 수
pub async fn count_students(pool: &SqlitePool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
