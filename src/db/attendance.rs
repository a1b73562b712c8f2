//! # 출결 스냅샷 데이터베이스 쿼리 모듈
//!
//! 스냅샷은 한 번 저장되면 삭제 외에는 바뀌지 않습니다.
//! `date` 컬럼은 `YYYY-MM-DD` 텍스트이고 UNIQUE라서, 같은 날짜를 두 번 저장하면
//! 고유키 위반(`duplicate_key`)이 됩니다.

use crate::error::AppError;
use crate::models::*;
use chrono::NaiveDate;
use sqlx::SqlitePool;

/// DB에 저장하는 날짜 형식. 문자열 비교가 곧 날짜 비교가 되도록 0을 채운 ISO 형식입니다.
const STORAGE_DATE_FORMAT: &str = "%Y-%m-%d";

const SNAPSHOT_COLUMNS: &str = "id, date, year, section, present_count, absent_count, leave_count, \
     od_count, late_count, total_students, status_entries, summary_text, created_at";

// SnapshotRow → DailySnapshot 변환 중 하나라도 실패하면 전체가 실패합니다
fn into_snapshots(rows: Vec<SnapshotRow>) -> Result<Vec<DailySnapshot>, AppError> {
    rows.into_iter().map(DailySnapshot::try_from).collect()
}

/// 계산된 요약을 새 스냅샷으로 저장합니다.
pub async fn insert_snapshot(
    pool: &SqlitePool,
    id: &str,
    year: CohortYear,
    section: &str,
    summary: &DailySummary,
) -> Result<DailySnapshot, AppError> {
    // 학생별 상태 목록은 JSON 텍스트 한 컬럼에 통째로 저장합니다
    let status_entries = serde_json::to_string(&summary.status_entries)
        .map_err(|e| AppError::Internal(format!("Could not encode status entries: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO attendance_snapshots
            (id, date, year, section, present_count, absent_count, leave_count,
             od_count, late_count, total_students, status_entries, summary_text)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(summary.date.format(STORAGE_DATE_FORMAT).to_string())
    .bind(year.as_str())
    .bind(section)
    .bind(summary.present_count)
    .bind(summary.absent_count)
    .bind(summary.leave_count)
    .bind(summary.od_count)
    .bind(summary.late_count)
    .bind(summary.total_students)
    .bind(status_entries)
    .bind(&summary.summary_text)
    .execute(pool)
    .await?;

    get_snapshot(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve saved snapshot".to_string()))
}

/// ID로 스냅샷 하나를 조회합니다.
///
/// `transpose()`: `Option<Result<T>>`를 `Result<Option<T>>`로 뒤집어 `?`를 쓸 수 있게 합니다.
pub async fn get_snapshot(pool: &SqlitePool, id: &str) -> Result<Option<DailySnapshot>, AppError> {
    let row = sqlx::query_as::<_, SnapshotRow>(&format!(
        "SELECT {} FROM attendance_snapshots WHERE id = ?",
        SNAPSHOT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(DailySnapshot::try_from).transpose()
}

/// 날짜로 조회합니다. `date`가 UNIQUE라 많아야 한 건입니다.
pub async fn find_by_date(pool: &SqlitePool, date: NaiveDate) -> Result<Option<DailySnapshot>, AppError> {
    let row = sqlx::query_as::<_, SnapshotRow>(&format!(
        "SELECT {} FROM attendance_snapshots WHERE date = ?",
        SNAPSHOT_COLUMNS
    ))
    .bind(date.format(STORAGE_DATE_FORMAT).to_string())
    .fetch_optional(pool)
    .await?;

    row.map(DailySnapshot::try_from).transpose()
}

/// 최신 날짜부터 스냅샷 목록을 조회합니다.
///
/// `start`/`end`는 양 끝을 포함하며, 둘 중 하나만 줄 수도 있습니다.
pub async fn list_snapshots(
    pool: &SqlitePool,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    limit: i64,
) -> Result<Vec<DailySnapshot>, AppError> {
    // NULL 파라미터는 해당 조건을 건너뜁니다
    let rows = sqlx::query_as::<_, SnapshotRow>(&format!(
        r#"
        SELECT {} FROM attendance_snapshots
        WHERE (?1 IS NULL OR date >= ?1)
          AND (?2 IS NULL OR date <= ?2)
        ORDER BY date DESC
        LIMIT ?3
        "#,
        SNAPSHOT_COLUMNS
    ))
    .bind(start.map(|d| d.format(STORAGE_DATE_FORMAT).to_string()))
    .bind(end.map(|d| d.format(STORAGE_DATE_FORMAT).to_string()))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    into_snapshots(rows)
}

/// 학생 이력과 전체 통계 계산용. 최신 날짜부터, 개수 제한 없이 돌려줍니다.
pub async fn list_all_snapshots(pool: &SqlitePool) -> Result<Vec<DailySnapshot>, AppError> {
    let rows = sqlx::query_as::<_, SnapshotRow>(&format!(
        "SELECT {} FROM attendance_snapshots ORDER BY date DESC",
        SNAPSHOT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    into_snapshots(rows)
}

/// 삭제되었으면 `true`, 해당 ID가 없었으면 `false`
pub async fn delete_snapshot(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM attendance_snapshots WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_snapshots(pool: &SqlitePool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance_snapshots")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
