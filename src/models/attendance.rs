//! # 출결 모델 정의
//!
//! - `AttendanceStatus`: 학생 한 명의 하루 출결 상태
//! - `StudentStatusEntry`: 스냅샷 안에 들어가는 학생별 상태 (독립적으로 조회되지 않음)
//! - `DailySnapshot`: 하루치 출결 기록. 저장 후에는 삭제 외에 변경되지 않습니다.
//! - `StudentHistory`: 학생 한 명의 기간 통계
//! - `GlobalSummary`: 전체 스냅샷 평균

use crate::error::AppError;
use crate::models::CohortYear;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// 출결 상태. `OnDuty`(공가)의 와이어 형식은 `"On Duty"`입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
    #[serde(rename = "On Duty", alias = "OnDuty", alias = "OD")]
    OnDuty,
    Late,
}

impl AttendanceStatus {
    /// 알 수 없는 값이거나 비어 있으면 `Present`로 간주합니다.
    pub fn parse_or_present(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok())
            .unwrap_or(AttendanceStatus::Present)
    }

    /// 출석 비율 계산에서 "출석"으로 보는 상태인지 여부
    pub fn counts_as_present(&self) -> bool {
        matches!(
            self,
            AttendanceStatus::Present | AttendanceStatus::Late | AttendanceStatus::OnDuty
        )
    }
}

impl FromStr for AttendanceStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 대소문자, 공백, 구두점을 무시: "on duty", "On-Duty", "OD" 모두 공가
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "leave" => Ok(AttendanceStatus::Leave),
            "onduty" | "od" => Ok(AttendanceStatus::OnDuty),
            "late" => Ok(AttendanceStatus::Late),
            _ => Err(()),
        }
    }
}

/// 스냅샷 안의 학생 한 명. 저장 시점의 이름과 학번을 복사해 두므로
/// 나중에 명단이 바뀌어도 과거 기록은 그대로입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentStatusEntry {
    /// 명단 순번 문자열
    pub student_id: String,
    pub roll_number: String,
    pub name: String,
    pub status: AttendanceStatus,
}

/// 저장된 하루치 출결 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySnapshot {
    pub id: String,
    pub date: NaiveDate,
    // 학년/분반이 없는 예전 기록도 읽을 수 있게 Option
    pub year: Option<CohortYear>,
    pub section: Option<String>,
    /// Present + Late + On Duty
    pub present_count: i64,
    pub absent_count: i64,
    pub leave_count: i64,
    pub od_count: i64,
    pub late_count: i64,
    pub total_students: i64,
    pub status_entries: Vec<StudentStatusEntry>,
    /// 복사해서 바로 공유할 수 있는 여러 줄 요약문
    pub summary_text: String,
    pub created_at: String,
}

/// `attendance_snapshots` 테이블의 원시 행.
/// 날짜는 `YYYY-MM-DD` 문자열, 학생별 상태는 JSON 배열 문자열로 저장됩니다.
#[derive(Debug, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: String,
    pub date: String,
    pub year: Option<CohortYear>,
    pub section: Option<String>,
    pub present_count: i64,
    pub absent_count: i64,
    pub leave_count: i64,
    pub od_count: i64,
    pub late_count: i64,
    pub total_students: i64,
    pub status_entries: String,
    pub summary_text: String,
    pub created_at: String,
}

impl TryFrom<SnapshotRow> for DailySnapshot {
    type Error = AppError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        // 저장된 값이 깨져 있으면 요청자 잘못이 아니므로 500
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| AppError::Internal(format!("Stored date {:?} is invalid: {}", row.date, e)))?;
        let status_entries = serde_json::from_str(&row.status_entries)
            .map_err(|e| AppError::Internal(format!("Stored status entries are invalid: {}", e)))?;

        Ok(DailySnapshot {
            id: row.id,
            date,
            year: row.year,
            section: row.section,
            present_count: row.present_count,
            absent_count: row.absent_count,
            leave_count: row.leave_count,
            od_count: row.od_count,
            late_count: row.late_count,
            total_students: row.total_students,
            status_entries,
            summary_text: row.summary_text,
            created_at: row.created_at,
        })
    }
}

/// 명단과 마킹으로부터 계산된, 아직 저장되지 않은 하루치 요약
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub present_count: i64,
    pub absent_count: i64,
    pub leave_count: i64,
    pub od_count: i64,
    pub late_count: i64,
    pub total_students: i64,
    pub status_entries: Vec<StudentStatusEntry>,
    pub summary_text: String,
}

/// `POST /api/attendance` 및 `/api/attendance/preview` 요청 본문
///
/// `markings`의 키는 학번(roll number) 또는 명단 순번(sequence number)입니다.
/// 값은 상태 문자열이며, 해석할 수 없으면 출석으로 처리됩니다.
#[derive(Debug, Deserialize)]
pub struct SaveAttendanceRequest {
    pub year: String,
    pub section: String,
    /// 생략하면 오늘 날짜
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub markings: HashMap<String, String>,
}

/// `GET /api/attendance` 쿼리 파라미터
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

/// `GET /api/attendance/student` 쿼리 파라미터.
/// 둘 중 하나라도 맞으면 같은 학생으로 봅니다 (OR 조건).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentMatcher {
    pub name: Option<String>,
    pub roll_no: Option<String>,
}

/// 상태별 날짜 목록 (`dd/mm/yyyy`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusDates {
    pub present: Vec<String>,
    pub absent: Vec<String>,
    pub leave: Vec<String>,
    pub od: Vec<String>,
    pub late: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentStatistics {
    /// 공가(On Duty) 일수를 뺀 총 일수. 비율의 분모입니다.
    pub total_days: i64,
    pub present_days: i64,
    pub absent_days: i64,
    pub leave_days: i64,
    pub od_days: i64,
    pub late_days: i64,
    pub present_percentage: String,
    pub absent_percentage: String,
    pub leave_percentage: String,
    pub late_percentage: String,
    pub dates: StatusDates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentHistory {
    pub student_info: StudentStatusEntry,
    pub statistics: StudentStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalSummary {
    pub avg_present: f64,
    pub avg_absent: f64,
    pub avg_leave: f64,
    pub avg_od: f64,
    pub total_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_is_lenient_about_spelling() {
        assert_eq!("On Duty".parse::<AttendanceStatus>(), Ok(AttendanceStatus::OnDuty));
        assert_eq!("on-duty".parse::<AttendanceStatus>(), Ok(AttendanceStatus::OnDuty));
        assert_eq!("OD".parse::<AttendanceStatus>(), Ok(AttendanceStatus::OnDuty));
        assert_eq!(" LATE ".parse::<AttendanceStatus>(), Ok(AttendanceStatus::Late));
        assert_eq!("sick".parse::<AttendanceStatus>(), Err(()));
    }

    #[test]
    fn unknown_or_missing_status_defaults_to_present() {
        assert_eq!(AttendanceStatus::parse_or_present(None), AttendanceStatus::Present);
        assert_eq!(
            AttendanceStatus::parse_or_present(Some("???")),
            AttendanceStatus::Present
        );
        assert_eq!(
            AttendanceStatus::parse_or_present(Some("Absent")),
            AttendanceStatus::Absent
        );
    }

    #[test]
    fn on_duty_uses_spaced_wire_name() {
        let json = serde_json::to_string(&AttendanceStatus::OnDuty).unwrap();
        assert_eq!(json, "\"On Duty\"");
        let back: AttendanceStatus = serde_json::from_str("\"OnDuty\"").unwrap();
        assert_eq!(back, AttendanceStatus::OnDuty);
    }

    #[test]
    fn snapshot_row_with_bad_json_is_rejected() {
        let row = SnapshotRow {
            id: "x".into(),
            date: "2024-03-01".into(),
            year: None,
            section: None,
            present_count: 0,
            absent_count: 0,
            leave_count: 0,
            od_count: 0,
            late_count: 0,
            total_students: 0,
            status_entries: "not json".into(),
            summary_text: String::new(),
            created_at: String::new(),
        };
        assert!(DailySnapshot::try_from(row).is_err());
    }
}
