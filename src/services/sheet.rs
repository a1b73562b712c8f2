//! # 스프레드시트 파싱
//!
//! 업로드된 파일 바이트를 "헤더 → 셀 텍스트" 행 목록으로 바꿉니다.
//! 첫 행은 헤더이고, 완전히 빈 행은 건너뜁니다.
//! - CSV: `csv` 크레이트
//! - 엑셀(.xlsx / .xls): `calamine` 크레이트, 첫 번째 시트만 읽음

use crate::error::AppError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::HashMap;
use std::io::Cursor;

/// 헤더 이름(1행에 적힌 그대로) → 셀 값
pub type SheetRow = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Excel,
}

pub fn parse_rows(bytes: &[u8], format: SheetFormat) -> Result<Vec<SheetRow>, AppError> {
    match format {
        SheetFormat::Csv => parse_csv(bytes),
        SheetFormat::Excel => parse_excel(bytes),
    }
}

/// 헤더와 각 행의 셀을 위치로 짝지어 맵을 만듭니다.
/// 헤더가 빈 열은 버리고, 셀이 모자란 행은 있는 만큼만 담습니다.
fn build_rows<I, R>(headers: Vec<String>, records: I) -> Vec<SheetRow>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    records
        .into_iter()
        .map(|record| {
            headers
                .iter()
                .cloned()
                .zip(record)
                .filter(|(header, _)| !header.is_empty())
                .collect::<SheetRow>()
        })
        .filter(|row| row.values().any(|v| !v.is_empty()))
        .collect()
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<SheetRow>, AppError> {
    // flexible: 행마다 열 개수가 달라도 에러로 보지 않음
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("Could not read CSV header: {}", e)))?
        .iter()
        // 엑셀에서 저장한 UTF-8 CSV의 BOM 제거
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let records = reader
        .records()
        .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::BadRequest(format!("Could not read CSV row: {}", e)))?;

    Ok(build_rows(headers, records))
}

fn parse_excel(bytes: &[u8]) -> Result<Vec<SheetRow>, AppError> {
    // 확장자 대신 내용으로 xls / xlsx / ods를 판별합니다
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::BadRequest(format!("Could not open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::BadRequest("Workbook has no sheets".to_string()))?
        .map_err(|e| AppError::BadRequest(format!("Could not read first sheet: {}", e)))?;

    // 첫 행은 헤더
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row.iter().map(cell_text).collect();
    let records: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(build_rows(headers, records))
}

/// 정수 값의 숫자 셀은 `.0` 없이 표기합니다 (순번, 학번이 숫자로 저장된 경우).
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Int(i) => i.to_string(),
        other => other.to_string().trim().to_string(),
    }
}
