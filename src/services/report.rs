//! # 출결 집계/리포트 서비스
//!
//! 저장된 스냅샷을 바꾸지 않고 통계를 계산하는 순수 함수들입니다.
//!
//! - `compute_daily_summary()`: 명단 + 마킹 → 하루치 카운트와 요약문
//! - `find_student_history()`: 스냅샷 목록 → 학생 한 명의 일수/비율/날짜 목록
//! - `compute_global_summary()`: 전체 스냅샷 → 상태별 평균
//!
//! ## 공가(On Duty) 이중 집계
//! 하루치 요약의 `present_count`는 Present + Late + On Duty를 모두 "출석"으로 셉니다.
//! 반면 학생별 이력의 비율은 공가 일수를 분모(`total_days`)에서 뺍니다.
//! 두 규칙 모두 그대로 유지합니다.

use crate::error::AppError;
use crate::models::*;
use chrono::NaiveDate;
use std::collections::HashMap;

/// 요약문과 이력에서 쓰는 날짜 표기
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// 요약문 마지막 줄
pub const CLOSING_LINE: &str = "Have a Very Nice Day";

/// 명단의 모든 학생에 대해 상태를 정하고 하루치 요약을 계산합니다.
///
/// 학생별 상태는 `markings`에서 학번 → 순번 순서로 찾고,
/// 없거나 해석할 수 없으면 `Present`로 처리합니다.
pub fn compute_daily_summary(
    markings: &HashMap<String, String>,
    roster: &[RosterEntry],
    date: NaiveDate,
    section_label: &str,
) -> DailySummary {
    let status_entries: Vec<StudentStatusEntry> = roster
        .iter()
        .map(|student| {
            // 학번이 빈 학생은 학번 키를 건너뛰고 바로 순번으로 찾습니다
            let raw = markings
                .get(&student.roll_number)
                .filter(|_| !student.roll_number.is_empty())
                .or_else(|| markings.get(&student.sequence_number.to_string()))
                .map(String::as_str);

            StudentStatusEntry {
                student_id: student.sequence_number.to_string(),
                roll_number: student.roll_number.clone(),
                name: student.display_name.clone(),
                status: AttendanceStatus::parse_or_present(raw),
            }
        })
        .collect();

    let count = |status: AttendanceStatus| {
        status_entries.iter().filter(|e| e.status == status).count() as i64
    };

    // Late, On Duty도 출석으로 셈
    let present_count = status_entries
        .iter()
        .filter(|e| e.status.counts_as_present())
        .count() as i64;
    let absent_count = count(AttendanceStatus::Absent);
    let leave_count = count(AttendanceStatus::Leave);
    let od_count = count(AttendanceStatus::OnDuty);
    let late_count = count(AttendanceStatus::Late);
    let total_students = status_entries.len() as i64;

    // 상태별 "(학번) 이름" 목록. 아무도 없으면 NIL
    let list = |status: AttendanceStatus| {
        let lines: Vec<String> = status_entries
            .iter()
            .filter(|e| e.status == status)
            .map(|e| format!("({}) {}", e.roll_number, e.name))
            .collect();
        if lines.is_empty() {
            "NIL".to_string()
        } else {
            lines.join("\n")
        }
    };

    // 줄 순서와 공백 줄까지 그대로 복사해 메신저에 붙여 넣는 형식입니다
    let summary_text = [
        format!("DATE : {}", date.format(DISPLAY_DATE_FORMAT)),
        format!("SECTION : {}", section_label),
        format!("PRESENT: {}/{}", present_count, total_students),
        format!("LEAVE: {}", leave_count),
        format!("ON DUTY: {}", od_count),
        format!("LATE: {}", late_count),
        format!("ABSENT: {}", absent_count),
        String::new(),
        "LEAVE".to_string(),
        list(AttendanceStatus::Leave),
        String::new(),
        "ON DUTY".to_string(),
        list(AttendanceStatus::OnDuty),
        String::new(),
        "LATE".to_string(),
        list(AttendanceStatus::Late),
        String::new(),
        "ABSENT".to_string(),
        list(AttendanceStatus::Absent),
        String::new(),
        CLOSING_LINE.to_string(),
    ]
    .join("\n");

    DailySummary {
        date,
        present_count,
        absent_count,
        leave_count,
        od_count,
        late_count,
        total_students,
        status_entries,
        summary_text,
    }
}

/// 이름(부분 일치, 대소문자 무시) 또는 학번(정확히 일치) 중 하나라도 맞는지 확인합니다.
struct Matcher {
    name: Option<String>,
    roll_no: Option<String>,
}

impl Matcher {
    fn new(query: &StudentMatcher) -> Option<Self> {
        let clean = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let name = clean(&query.name).map(|n| n.to_lowercase());
        let roll_no = clean(&query.roll_no);
        if name.is_none() && roll_no.is_none() {
            return None;
        }
        Some(Self { name, roll_no })
    }

    fn matches(&self, entry: &StudentStatusEntry) -> bool {
        let by_name = self
            .name
            .as_ref()
            .is_some_and(|n| entry.name.to_lowercase().contains(n.as_str()));
        let by_roll = self
            .roll_no
            .as_ref()
            .is_some_and(|r| entry.roll_number == *r);
        by_name || by_roll
    }
}

/// 소수 첫째 자리까지의 백분율 문자열. 분모가 0이면 "0.0".
fn percentage(count: i64, total_days: i64) -> String {
    if total_days <= 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", count as f64 / total_days as f64 * 100.0)
}

/// 학생 한 명의 출결 이력을 집계합니다.
///
/// `snapshots`는 날짜 내림차순이어야 합니다. 각 스냅샷에서 처음 일치하는 학생만 봅니다.
///
/// # 에러
/// - 이름과 학번이 모두 비어 있으면 `BadRequest`
/// - 일치하는 스냅샷이 하나도 없으면 `NotFound`
pub fn find_student_history(
    snapshots: &[DailySnapshot],
    query: &StudentMatcher,
) -> Result<StudentHistory, AppError> {
    let matcher = Matcher::new(query)
        .ok_or_else(|| AppError::BadRequest("Either name or roll_no is required".to_string()))?;

    let mut student_info: Option<StudentStatusEntry> = None;
    let mut stats = StudentStatistics::default();
    let mut matched_days = 0i64;

    for snapshot in snapshots {
        let Some(entry) = snapshot.status_entries.iter().find(|e| matcher.matches(e)) else {
            continue;
        };
        // 가장 최근 스냅샷의 학생 정보를 대표로 씁니다
        if student_info.is_none() {
            student_info = Some(entry.clone());
        }
        matched_days += 1;

        let date = snapshot.date.format(DISPLAY_DATE_FORMAT).to_string();
        match entry.status {
            AttendanceStatus::Present => {
                stats.present_days += 1;
                stats.dates.present.push(date);
            }
            AttendanceStatus::Absent => {
                stats.absent_days += 1;
                stats.dates.absent.push(date);
            }
            AttendanceStatus::Leave => {
                stats.leave_days += 1;
                stats.dates.leave.push(date);
            }
            AttendanceStatus::OnDuty => {
                stats.od_days += 1;
                stats.dates.od.push(date);
            }
            AttendanceStatus::Late => {
                stats.late_days += 1;
                stats.dates.late.push(date);
            }
        }
    }

    let student_info = student_info
        .ok_or_else(|| AppError::NotFound("No records found for this student".to_string()))?;

    // 공가는 출결 분모에서 제외
    stats.total_days = matched_days - stats.od_days;
    stats.present_percentage = percentage(stats.present_days, stats.total_days);
    stats.absent_percentage = percentage(stats.absent_days, stats.total_days);
    stats.leave_percentage = percentage(stats.leave_days, stats.total_days);
    stats.late_percentage = percentage(stats.late_days, stats.total_days);

    Ok(StudentHistory {
        student_info,
        statistics: stats,
    })
}

/// 전체 스냅샷의 상태별 평균. 스냅샷이 없으면 `None`.
pub fn compute_global_summary(snapshots: &[DailySnapshot]) -> Option<GlobalSummary> {
    if snapshots.is_empty() {
        return None;
    }
    let n = snapshots.len() as f64;
    let avg = |field: fn(&DailySnapshot) -> i64| {
        snapshots.iter().map(field).sum::<i64>() as f64 / n
    };

    Some(GlobalSummary {
        avg_present: avg(|s| s.present_count),
        avg_absent: avg(|s| s.absent_count),
        avg_leave: avg(|s| s.leave_count),
        avg_od: avg(|s| s.od_count),
        total_days: snapshots.len() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(seq: i64, name: &str, roll: &str) -> RosterEntry {
        RosterEntry {
            id: format!("id-{}", seq),
            year: CohortYear::SecondYear,
            section: "C".to_string(),
            sequence_number: seq,
            display_name: name.to_string(),
            roll_number: roll.to_string(),
            register_number: String::new(),
            department: "CSE".to_string(),
        }
    }

    fn markings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot(date: NaiveDate, entries: &[(&str, &str, AttendanceStatus)]) -> DailySnapshot {
        let status_entries: Vec<StudentStatusEntry> = entries
            .iter()
            .enumerate()
            .map(|(i, (roll, name, status))| StudentStatusEntry {
                student_id: (i + 1).to_string(),
                roll_number: roll.to_string(),
                name: name.to_string(),
                status: *status,
            })
            .collect();
        let count = |s: AttendanceStatus| {
            status_entries.iter().filter(|e| e.status == s).count() as i64
        };
        DailySnapshot {
            id: format!("snap-{}", date),
            date,
            year: None,
            section: None,
            present_count: status_entries
                .iter()
                .filter(|e| e.status.counts_as_present())
                .count() as i64,
            absent_count: count(AttendanceStatus::Absent),
            leave_count: count(AttendanceStatus::Leave),
            od_count: count(AttendanceStatus::OnDuty),
            late_count: count(AttendanceStatus::Late),
            total_students: status_entries.len() as i64,
            status_entries,
            summary_text: String::new(),
            created_at: String::new(),
        }
    }

    fn by_roll(roll: &str) -> StudentMatcher {
        StudentMatcher {
            name: None,
            roll_no: Some(roll.to_string()),
        }
    }

    #[test]
    fn two_student_roster_summary() {
        let roster = vec![student(1, "Asha", "R1"), student(2, "Ben", "R2")];
        let summary = compute_daily_summary(
            &markings(&[("R1", "Present"), ("R2", "Absent")]),
            &roster,
            day(2024, 3, 1),
            "SECOND YEAR C",
        );

        assert_eq!(summary.present_count, 1);
        assert_eq!(summary.absent_count, 1);
        assert_eq!(summary.leave_count, 0);
        assert_eq!(summary.od_count, 0);
        assert_eq!(summary.late_count, 0);
        assert_eq!(summary.total_students, 2);
        assert!(summary.summary_text.contains("PRESENT: 1/2"));
        assert!(summary.summary_text.contains("ABSENT\n(R2) Ben"));
        assert!(summary.summary_text.contains("LEAVE\nNIL"));
        assert!(summary
            .summary_text
            .ends_with("ABSENT\n(R2) Ben\n\nHave a Very Nice Day"));
        assert!(summary.summary_text.starts_with("DATE : 01/03/2024\nSECTION : SECOND YEAR C\n"));
    }

    #[test]
    fn unmarked_and_unknown_statuses_count_as_present() {
        let roster = vec![
            student(1, "Asha", "R1"),
            student(2, "Ben", "R2"),
            student(3, "Chen", "R3"),
        ];
        let summary = compute_daily_summary(
            &markings(&[("R2", "napping")]),
            &roster,
            day(2024, 3, 1),
            "X",
        );

        assert_eq!(summary.present_count, 3);
        assert!(summary
            .status_entries
            .iter()
            .all(|e| e.status == AttendanceStatus::Present));
    }

    #[test]
    fn markings_fall_back_to_sequence_number() {
        let roster = vec![student(1, "Asha", ""), student(2, "Ben", "R2")];
        let summary = compute_daily_summary(
            &markings(&[("1", "Leave"), ("R2", "Late")]),
            &roster,
            day(2024, 3, 1),
            "X",
        );

        assert_eq!(summary.status_entries[0].status, AttendanceStatus::Leave);
        assert_eq!(summary.status_entries[0].student_id, "1");
        assert_eq!(summary.status_entries[1].status, AttendanceStatus::Late);
    }

    #[test]
    fn summary_keeps_both_present_accountings() {
        let roster = vec![
            student(1, "A", "R1"),
            student(2, "B", "R2"),
            student(3, "C", "R3"),
            student(4, "D", "R4"),
            student(5, "E", "R5"),
            student(6, "F", "R6"),
        ];
        let summary = compute_daily_summary(
            &markings(&[
                ("R1", "Present"),
                ("R2", "Late"),
                ("R3", "On Duty"),
                ("R4", "Absent"),
                ("R5", "Leave"),
                ("R6", "Present"),
            ]),
            &roster,
            day(2024, 3, 1),
            "X",
        );

        // present 카운트는 Present + Late + On Duty
        assert_eq!(summary.present_count, 4);
        // 순수 출석 + 결석 + 휴가 + 지각 = 공가를 뺀 전체
        let present_only = summary.present_count - summary.late_count - summary.od_count;
        assert_eq!(
            present_only + summary.absent_count + summary.leave_count + summary.late_count,
            summary.total_students - summary.od_count
        );
        assert!(summary.summary_text.contains("ON DUTY\n(R3) C"));
        assert!(summary.summary_text.contains("LATE\n(R2) B"));
    }

    #[test]
    fn summary_does_not_touch_roster() {
        let roster = vec![student(1, "Asha", "R1")];
        let before = roster.clone();
        let _ = compute_daily_summary(&markings(&[("R1", "Absent")]), &roster, day(2024, 3, 1), "X");
        assert_eq!(roster, before);
    }

    #[test]
    fn on_duty_day_is_removed_from_denominator() {
        // 최신 날짜가 먼저 오도록 정렬된 입력
        let snapshots = vec![
            snapshot(day(2024, 3, 2), &[("R1", "Asha", AttendanceStatus::OnDuty)]),
            snapshot(day(2024, 3, 1), &[("R1", "Asha", AttendanceStatus::Present)]),
        ];

        let history = find_student_history(&snapshots, &by_roll("R1")).unwrap();
        assert_eq!(history.statistics.total_days, 1);
        assert_eq!(history.statistics.od_days, 1);
        assert_eq!(history.statistics.present_percentage, "100.0");
        assert_eq!(history.statistics.dates.od, vec!["02/03/2024".to_string()]);
        assert_eq!(history.student_info.status, AttendanceStatus::OnDuty);
    }

    #[test]
    fn only_on_duty_days_give_zero_percentages() {
        let snapshots = vec![snapshot(day(2024, 3, 1), &[("R1", "Asha", AttendanceStatus::OnDuty)])];

        let stats = find_student_history(&snapshots, &by_roll("R1")).unwrap().statistics;
        assert_eq!(stats.total_days, 0);
        assert_eq!(stats.present_percentage, "0.0");
        assert_eq!(stats.absent_percentage, "0.0");
        assert_eq!(stats.leave_percentage, "0.0");
        assert_eq!(stats.late_percentage, "0.0");
    }

    #[test]
    fn name_or_roll_either_matches() {
        let snapshots = vec![
            snapshot(
                day(2024, 3, 3),
                &[("R1", "Asha Devi", AttendanceStatus::Absent), ("R2", "Ben", AttendanceStatus::Present)],
            ),
            snapshot(day(2024, 3, 2), &[("R9", "Ben", AttendanceStatus::Late)]),
            snapshot(day(2024, 3, 1), &[("R2", "Benjamin", AttendanceStatus::Leave)]),
        ];
        let query = StudentMatcher {
            name: Some("  asha ".to_string()),
            roll_no: Some("R2".to_string()),
        };

        let history = find_student_history(&snapshots, &query).unwrap();
        // 3일 중 R9 Ben만 불일치
        assert_eq!(history.statistics.total_days, 2);
        assert_eq!(history.statistics.absent_days, 1);
        assert_eq!(history.statistics.leave_days, 1);
        assert_eq!(history.statistics.absent_percentage, "50.0");
        assert_eq!(history.student_info.name, "Asha Devi");
    }

    #[test]
    fn percentages_round_to_one_decimal() {
        let snapshots = vec![
            snapshot(day(2024, 3, 3), &[("R1", "A", AttendanceStatus::Present)]),
            snapshot(day(2024, 3, 2), &[("R1", "A", AttendanceStatus::Absent)]),
            snapshot(day(2024, 3, 1), &[("R1", "A", AttendanceStatus::Absent)]),
        ];
        let stats = find_student_history(&snapshots, &by_roll("R1")).unwrap().statistics;
        assert_eq!(stats.present_percentage, "33.3");
        assert_eq!(stats.absent_percentage, "66.7");
    }

    #[test]
    fn history_is_idempotent() {
        let snapshots = vec![
            snapshot(day(2024, 3, 2), &[("R1", "A", AttendanceStatus::Late)]),
            snapshot(day(2024, 3, 1), &[("R1", "A", AttendanceStatus::Present)]),
        ];
        let first = find_student_history(&snapshots, &by_roll("R1")).unwrap();
        let second = find_student_history(&snapshots, &by_roll("R1")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn no_match_is_not_found_and_empty_query_is_rejected() {
        let snapshots = vec![snapshot(day(2024, 3, 1), &[("R1", "A", AttendanceStatus::Present)])];

        let missing = find_student_history(&snapshots, &by_roll("R404")).unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));

        let empty = find_student_history(&snapshots, &StudentMatcher::default()).unwrap_err();
        assert!(matches!(empty, AppError::BadRequest(_)));
    }

    #[test]
    fn global_summary_averages_counts() {
        let snapshots = vec![
            snapshot(
                day(2024, 3, 2),
                &[("R1", "A", AttendanceStatus::Present), ("R2", "B", AttendanceStatus::Absent)],
            ),
            snapshot(
                day(2024, 3, 1),
                &[("R1", "A", AttendanceStatus::OnDuty), ("R2", "B", AttendanceStatus::Leave)],
            ),
        ];

        let summary = compute_global_summary(&snapshots).unwrap();
        assert_eq!(summary.total_days, 2);
        assert_eq!(summary.avg_present, 1.0);
        assert_eq!(summary.avg_absent, 0.5);
        assert_eq!(summary.avg_leave, 0.5);
        assert_eq!(summary.avg_od, 0.5);
    }

    #[test]
    fn global_summary_of_nothing_is_none() {
        assert!(compute_global_summary(&[]).is_none());
    }
}
