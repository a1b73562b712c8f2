//! # 명단(Roster) 모델 정의
//!
//! 학생은 학년(`CohortYear`)과 분반(section) 단위로 묶입니다.
//! 예전에는 학년마다 필드 이름이 다른 별도 컬렉션을 썼지만,
//! 지금은 `RosterEntry` 하나로 통합하고 학년을 태그로 둡니다.
//! 예전 형식의 레코드는 `LegacyStudent`로 받아 한 번만 변환합니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 학년. 와이어 형식은 `first-year`, `second-year`, `third-year`, `final-year`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum CohortYear {
    FirstYear,
    SecondYear,
    ThirdYear,
    FinalYear,
}

impl CohortYear {
    pub const ALL: [CohortYear; 4] = [
        CohortYear::FirstYear,
        CohortYear::SecondYear,
        CohortYear::ThirdYear,
        CohortYear::FinalYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CohortYear::FirstYear => "first-year",
            CohortYear::SecondYear => "second-year",
            CohortYear::ThirdYear => "third-year",
            CohortYear::FinalYear => "final-year",
        }
    }

    /// 출결 요약문에 들어가는 사람이 읽는 이름
    pub fn label(&self) -> &'static str {
        match self {
            CohortYear::FirstYear => "FIRST YEAR",
            CohortYear::SecondYear => "SECOND YEAR",
            CohortYear::ThirdYear => "THIRD YEAR",
            CohortYear::FinalYear => "FINAL YEAR",
        }
    }
}

impl fmt::Display for CohortYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CohortYear {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CohortYear::ALL
            .into_iter()
            .find(|year| year.as_str() == s)
            .ok_or_else(|| format!("Unknown year \"{}\"", s))
    }
}

/// 분반 이름을 정규화합니다. 앞뒤 공백 제거 후 대문자.
pub fn normalize_section(name: &str) -> String {
    name.trim().to_uppercase()
}

/// 분반: DB의 `sections` 테이블 한 행
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Section {
    pub year: CohortYear,
    pub name: String,
    pub created_at: String,
}

/// 학생 한 명: DB의 `students` 테이블 한 행
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RosterEntry {
    pub id: String,
    pub year: CohortYear,
    pub section: String,
    pub sequence_number: i64,
    pub display_name: String,
    pub roll_number: String,
    pub register_number: String,
    pub department: String,
}

/// 아직 저장되지 않은 학생 행. 업로드 파싱 결과이자 INSERT 입력입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRosterEntry {
    pub sequence_number: i64,
    pub display_name: String,
    pub roll_number: String,
    pub register_number: String,
    pub department: String,
}

/// `POST /api/sections/{year}` 요청 본문
#[derive(Debug, Deserialize)]
pub struct CreateSectionRequest {
    pub section: Option<String>,
}

/// 예전 학년별 컬렉션의 학생 레코드.
///
/// 1학년은 `studentName / rollNumber / registerNo`,
/// 나머지 학년은 `name / rollNo / regNo`를 썼습니다.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStudent {
    #[serde(rename = "sNo")]
    pub s_no: Option<i64>,
    pub student_name: Option<String>,
    pub roll_number: Option<String>,
    pub register_no: Option<String>,
    pub name: Option<String>,
    pub roll_no: Option<String>,
    pub reg_no: Option<String>,
    pub department: Option<String>,
}

impl LegacyStudent {
    /// 레코드에 적힌 순번. 양수가 아니면 없는 것으로 봅니다.
    pub fn sequence(&self) -> Option<i64> {
        self.s_no.filter(|n| *n > 0)
    }

    /// 통합 명단 형식으로 변환합니다. 순번은 호출하는 쪽에서 겹치지 않게 정해 넘깁니다.
    pub fn into_entry(self, sequence_number: i64) -> NewRosterEntry {
        fn first(values: [Option<String>; 2]) -> String {
            values
                .into_iter()
                .flatten()
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
                .unwrap_or_default()
        }

        NewRosterEntry {
            sequence_number,
            display_name: first([self.student_name, self.name]),
            roll_number: first([self.roll_number, self.roll_no]),
            register_number: first([self.register_no, self.reg_no]),
            department: first([self.department, Some("CSE".to_string())]),
        }
    }
}
