//! # 명단 일괄 업로드
//!
//! 업로드 파일 검증과, 파싱된 행을 `NewRosterEntry`로 바꾸는 규칙을 담습니다.
//!
//! 스프레드시트마다 헤더 이름이 조금씩 달라서, 필드마다 허용하는 헤더 별칭을
//! 우선순위 순서대로 표(`FIRST_YEAR_COLUMNS`, `SENIOR_COLUMNS`)로 정의하고
//! `resolve_field()` 하나로만 조회합니다.

use crate::error::AppError;
use crate::models::{CohortYear, NewRosterEntry};
use crate::services::sheet::{SheetFormat, SheetRow};
use std::collections::HashSet;

/// 업로드 파일 최대 크기 (5 MiB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const DEFAULT_DEPARTMENT: &str = "CSE";

/// 허용하는 Content-Type과 파서 종류
pub const ACCEPTED_CONTENT_TYPES: [(&str, SheetFormat); 3] = [
    ("application/vnd.ms-excel", SheetFormat::Excel),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        SheetFormat::Excel,
    ),
    ("text/csv", SheetFormat::Csv),
];

/// 파싱 전에 Content-Type과 크기를 검사하고, 사용할 파서 종류를 돌려줍니다.
pub fn validate_upload(content_type: Option<&str>, size: usize) -> Result<SheetFormat, AppError> {
    // `text/csv; charset=utf-8`처럼 매개변수가 붙어도 MIME 본체만 비교
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let format = ACCEPTED_CONTENT_TYPES
        .iter()
        .find(|(accepted, _)| *accepted == mime)
        .map(|(_, format)| *format)
        .ok_or_else(|| AppError::BadRequest("Only Excel and CSV files are allowed".to_string()))?;

    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest(format!(
            "File is too large ({} bytes, limit {} bytes)",
            size, MAX_UPLOAD_BYTES
        )));
    }

    Ok(format)
}

/// 명단 항목의 필드. 별칭 표의 키입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterField {
    Sequence,
    Name,
    RollNumber,
    RegisterNumber,
    Department,
}

pub type ColumnAliases = [(RosterField, &'static [&'static str])];

/// 1학년 명단 양식
pub const FIRST_YEAR_COLUMNS: &ColumnAliases = &[
    (RosterField::Sequence, &["S. No", "SNo"]),
    (RosterField::Name, &["Student Name", "studentName", "Name"]),
    (RosterField::RollNumber, &["Roll Number", "rollNumber", "RollNo"]),
    (RosterField::RegisterNumber, &["Register No", "registerNo", "RegNo"]),
    (RosterField::Department, &["Department", "Dept"]),
];

/// 2~4학년 명단 양식
pub const SENIOR_COLUMNS: &ColumnAliases = &[
    (RosterField::Sequence, &["S. No", "SNo"]),
    (RosterField::Name, &["Name", "Student Name", "name"]),
    (RosterField::RollNumber, &["RollNo", "Roll Number", "rollNo"]),
    (RosterField::RegisterNumber, &["RegNo", "Register No", "regNo"]),
    (RosterField::Department, &["Department", "Dept"]),
];

pub fn column_aliases(year: CohortYear) -> &'static ColumnAliases {
    match year {
        CohortYear::FirstYear => FIRST_YEAR_COLUMNS,
        _ => SENIOR_COLUMNS,
    }
}

/// 별칭을 순서대로 시도해 처음 나오는 비어 있지 않은 셀 값을 돌려줍니다. 없으면 "".
pub fn resolve_field<'a>(row: &'a SheetRow, aliases: &ColumnAliases, field: RosterField) -> &'a str {
    aliases
        .iter()
        .filter(|(f, _)| *f == field)
        .flat_map(|(_, names)| names.iter())
        .filter_map(|name| row.get(*name))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

/// 양의 정수만 순번으로 인정합니다. 엑셀에서 넘어온 `3.0`도 3으로 봅니다.
fn parse_sequence(raw: &str) -> Option<i64> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n).filter(|n| *n > 0);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.fract() == 0.0 && *f >= 1.0)
        .map(|f| f as i64)
}

/// 행마다 순번을 정합니다. 결과는 입력과 같은 길이이고 모든 값이 서로 다릅니다.
///
/// 순번은 분반 안에서 유일해야 하므로 두 단계로 정합니다.
/// 1. 순번이 적힌 행이 먼저 그 번호를 차지합니다 (중복이면 뒤 행은 양보).
/// 2. 남은 행은 1부터 시작하는 행 위치에서 출발해, 비어 있는 다음 번호를 받습니다.
pub fn assign_sequence_numbers(explicit: &[Option<i64>]) -> Vec<i64> {
    // 1단계: 명시된 순번 선점
    let mut taken = HashSet::new();
    let claimed: Vec<Option<i64>> = explicit
        .iter()
        .map(|n| n.filter(|n| taken.insert(*n)))
        .collect();

    // 2단계: 나머지 행에 빈 번호 배정
    claimed
        .into_iter()
        .enumerate()
        .map(|(index, sequence)| {
            sequence.unwrap_or_else(|| {
                let mut candidate = index as i64 + 1;
                while !taken.insert(candidate) {
                    candidate += 1;
                }
                candidate
            })
        })
        .collect()
}

/// 파싱된 행을 명단 항목으로 변환합니다. 행 하나당 항목 하나.
///
/// 순번 열이 없거나 양의 정수가 아닌 행은 `assign_sequence_numbers()`가 빈 번호를 줍니다.
pub fn rows_to_entries(rows: &[SheetRow], year: CohortYear) -> Vec<NewRosterEntry> {
    let aliases = column_aliases(year);

    let explicit: Vec<Option<i64>> = rows
        .iter()
        .map(|row| parse_sequence(resolve_field(row, aliases, RosterField::Sequence)))
        .collect();

    rows.iter()
        .zip(assign_sequence_numbers(&explicit))
        .map(|(row, sequence_number)| {
            let field = |f| resolve_field(row, aliases, f).to_string();
            let department = field(RosterField::Department);

            NewRosterEntry {
                sequence_number,
                display_name: field(RosterField::Name),
                roll_number: field(RosterField::RollNumber),
                register_number: field(RosterField::RegisterNumber),
                department: if department.is_empty() {
                    DEFAULT_DEPARTMENT.to_string()
                } else {
                    department
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> SheetRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn accepts_known_types_only() {
        assert_eq!(validate_upload(Some("text/csv"), 10).unwrap(), SheetFormat::Csv);
        assert_eq!(
            validate_upload(Some("text/csv; charset=utf-8"), 10).unwrap(),
            SheetFormat::Csv
        );
        assert_eq!(
            validate_upload(
                Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
                10
            )
            .unwrap(),
            SheetFormat::Excel
        );
        assert!(validate_upload(Some("application/pdf"), 10).is_err());
        assert!(validate_upload(None, 10).is_err());
    }

    #[test]
    fn rejects_files_over_five_mebibytes() {
        assert!(validate_upload(Some("text/csv"), MAX_UPLOAD_BYTES).is_ok());
        let err = validate_upload(Some("text/csv"), MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn alias_priority_depends_on_cohort() {
        let r = row(&[("Name", "Short"), ("Student Name", "Long Name")]);

        assert_eq!(resolve_field(&r, FIRST_YEAR_COLUMNS, RosterField::Name), "Long Name");
        assert_eq!(resolve_field(&r, SENIOR_COLUMNS, RosterField::Name), "Short");
    }

    #[test]
    fn empty_cells_fall_through_to_next_alias() {
        let r = row(&[("RollNo", "  "), ("Roll Number", "R7")]);
        assert_eq!(resolve_field(&r, SENIOR_COLUMNS, RosterField::RollNumber), "R7");
        assert_eq!(resolve_field(&r, SENIOR_COLUMNS, RosterField::RegisterNumber), "");
    }

    #[test]
    fn rows_become_entries_with_sequence_fallback() {
        let rows = vec![
            row(&[("SNo", "10"), ("Name", "Asha"), ("RollNo", "R1"), ("RegNo", "900")]),
            row(&[("SNo", ""), ("Name", "Ben"), ("RollNo", "R2")]),
            row(&[("SNo", "abc"), ("Name", "Chen"), ("Dept", "ECE")]),
        ];

        let entries = rows_to_entries(&rows, CohortYear::SecondYear);
        assert_eq!(entries.len(), rows.len());
        assert_eq!(entries[0].sequence_number, 10);
        assert_eq!(entries[0].register_number, "900");
        assert_eq!(entries[1].sequence_number, 2);
        assert_eq!(entries[1].department, "CSE");
        assert_eq!(entries[2].sequence_number, 3);
        assert_eq!(entries[2].department, "ECE");
        assert_eq!(entries[2].roll_number, "");
    }

    #[test]
    fn blank_sequence_skips_numbers_already_claimed() {
        let rows = vec![
            row(&[("SNo", "2"), ("Name", "Asha"), ("RollNo", "R1")]),
            row(&[("SNo", ""), ("Name", "Ben"), ("RollNo", "R2")]),
        ];

        let numbers: Vec<i64> = rows_to_entries(&rows, CohortYear::SecondYear)
            .iter()
            .map(|e| e.sequence_number)
            .collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn repeated_sequence_gets_a_free_number() {
        let rows = vec![
            row(&[("SNo", "1"), ("Name", "Asha")]),
            row(&[("SNo", "1"), ("Name", "Ben")]),
            row(&[("SNo", "3"), ("Name", "Chen")]),
        ];

        let numbers: Vec<i64> = rows_to_entries(&rows, CohortYear::SecondYear)
            .iter()
            .map(|e| e.sequence_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn assigned_sequences_are_unique() {
        assert_eq!(assign_sequence_numbers(&[None, Some(1), None]), vec![2, 1, 3]);
        assert_eq!(assign_sequence_numbers(&[Some(5), Some(5), None]), vec![5, 2, 3]);
        assert!(assign_sequence_numbers(&[]).is_empty());
    }

    #[test]
    fn first_year_sheet_uses_long_headers() {
        let rows = vec![row(&[
            ("S. No", "1.0"),
            ("Student Name", "Asha"),
            ("Roll Number", "R1"),
            ("Register No", "9100"),
        ])];

        let entry = &rows_to_entries(&rows, CohortYear::FirstYear)[0];
        assert_eq!(entry.sequence_number, 1);
        assert_eq!(entry.display_name, "Asha");
        assert_eq!(entry.roll_number, "R1");
        assert_eq!(entry.register_number, "9100");
    }
}
