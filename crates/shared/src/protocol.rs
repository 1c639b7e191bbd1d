use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Aspirant, ContractType, Period, Professor, ProfessorStatus, Trimester,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    Create,
    Update,
}

/// What a persistence gateway reports back for one save call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    Rejected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl SaveOutcome {
    pub fn saved(id: impl ToString) -> Self {
        Self::Saved {
            id: Some(id.to_string()),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: Some(reason.into()),
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// Period as the data service expects it: the form's `id` travels as `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub code: String,
    pub name: String,
    pub year: i32,
    pub trimester: Trimester,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub enrollment_start: NaiveDate,
    pub enrollment_end: NaiveDate,
    pub is_active: bool,
}

impl From<&Period> for PeriodRecord {
    fn from(period: &Period) -> Self {
        Self {
            code: period.id.clone(),
            name: period.name.clone(),
            year: period.year,
            trimester: period.trimester,
            start_date: period.start_date,
            end_date: period.end_date,
            enrollment_start: period.enrollment_start,
            enrollment_end: period.enrollment_end,
            is_active: period.is_active,
        }
    }
}

impl From<PeriodRecord> for Period {
    fn from(record: PeriodRecord) -> Self {
        Self {
            id: record.code,
            name: record.name,
            year: record.year,
            trimester: record.trimester,
            start_date: record.start_date,
            end_date: record.end_date,
            enrollment_start: record.enrollment_start,
            enrollment_end: record.enrollment_end,
            is_active: record.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessorRecord {
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub contract_type: ContractType,
    pub status: ProfessorStatus,
    pub hire_date: NaiveDate,
}

impl From<&Professor> for ProfessorRecord {
    fn from(professor: &Professor) -> Self {
        Self {
            national_id: professor.national_id.clone(),
            first_name: professor.first_name.clone(),
            last_name: professor.last_name.clone(),
            email: professor.email.clone(),
            contract_type: professor.contract_type,
            status: professor.status,
            hire_date: professor.hire_date,
        }
    }
}

impl From<ProfessorRecord> for Professor {
    fn from(record: ProfessorRecord) -> Self {
        Self {
            national_id: record.national_id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            contract_type: record.contract_type,
            status: record.status,
            hire_date: record.hire_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspirantRecord {
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub program: String,
    pub birth_date: NaiveDate,
    pub application_date: NaiveDate,
    pub is_admitted: bool,
}

impl From<&Aspirant> for AspirantRecord {
    fn from(aspirant: &Aspirant) -> Self {
        Self {
            national_id: aspirant.national_id.clone(),
            first_name: aspirant.first_name.clone(),
            last_name: aspirant.last_name.clone(),
            program: aspirant.program.clone(),
            birth_date: aspirant.birth_date,
            application_date: aspirant.application_date,
            is_admitted: aspirant.is_admitted,
        }
    }
}

impl From<AspirantRecord> for Aspirant {
    fn from(record: AspirantRecord) -> Self {
        Self {
            national_id: record.national_id,
            first_name: record.first_name,
            last_name: record.last_name,
            program: record.program,
            birth_date: record.birth_date,
            application_date: record.application_date,
            is_admitted: record.is_admitted,
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
