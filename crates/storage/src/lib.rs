use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use forms::{FormEntity, Gateway};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, warn};

use shared::{
    domain::{Aspirant, ContractType, Period, Professor, ProfessorStatus, RecordId, Trimester},
    protocol::{AspirantRecord, PeriodRecord, ProfessorRecord, SaveMode, SaveOutcome},
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn insert_period(&self, period: &PeriodRecord) -> Result<RecordId> {
        let rec = sqlx::query(
            r#"
            INSERT INTO periods (
                code, name, year, trimester, start_date, end_date,
                enrollment_start, enrollment_end, is_active
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING id
            "#,
        )
        .bind(&period.code)
        .bind(&period.name)
        .bind(period.year)
        .bind(period.trimester.as_token())
        .bind(period.start_date)
        .bind(period.end_date)
        .bind(period.enrollment_start)
        .bind(period.enrollment_end)
        .bind(period.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(RecordId(rec.get::<i64, _>(0)))
    }

    /// Returns `None` when no period has `period.code`.
    pub async fn update_period(&self, period: &PeriodRecord) -> Result<Option<RecordId>> {
        let rec = sqlx::query(
            r#"
            UPDATE periods SET
                name = ?2,
                year = ?3,
                trimester = ?4,
                start_date = ?5,
                end_date = ?6,
                enrollment_start = ?7,
                enrollment_end = ?8,
                is_active = ?9,
                updated_at = CURRENT_TIMESTAMP
            WHERE code = ?1
            RETURNING id
            "#,
        )
        .bind(&period.code)
        .bind(&period.name)
        .bind(period.year)
        .bind(period.trimester.as_token())
        .bind(period.start_date)
        .bind(period.end_date)
        .bind(period.enrollment_start)
        .bind(period.enrollment_end)
        .bind(period.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec.map(|r| RecordId(r.get::<i64, _>(0))))
    }

    pub async fn get_period(&self, code: &str) -> Result<Option<PeriodRecord>> {
        let row = sqlx::query(
            r#"
            SELECT code, name, year, trimester, start_date, end_date,
                   enrollment_start, enrollment_end, is_active
            FROM periods
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| period_from_row(&row)).transpose()
    }

    pub async fn list_periods(&self) -> Result<Vec<PeriodRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT code, name, year, trimester, start_date, end_date,
                   enrollment_start, enrollment_end, is_active
            FROM periods
            ORDER BY year DESC, trimester DESC, code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(period_from_row).collect()
    }

    pub async fn insert_professor(&self, professor: &ProfessorRecord) -> Result<RecordId> {
        let rec = sqlx::query(
            r#"
            INSERT INTO professors (
                national_id, first_name, last_name, email, contract_type, status, hire_date
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id
            "#,
        )
        .bind(&professor.national_id)
        .bind(&professor.first_name)
        .bind(&professor.last_name)
        .bind(&professor.email)
        .bind(professor.contract_type.as_token())
        .bind(professor.status.as_token())
        .bind(professor.hire_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(RecordId(rec.get::<i64, _>(0)))
    }

    pub async fn update_professor(&self, professor: &ProfessorRecord) -> Result<Option<RecordId>> {
        let rec = sqlx::query(
            r#"
            UPDATE professors SET
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                contract_type = ?5,
                status = ?6,
                hire_date = ?7,
                updated_at = CURRENT_TIMESTAMP
            WHERE national_id = ?1
            RETURNING id
            "#,
        )
        .bind(&professor.national_id)
        .bind(&professor.first_name)
        .bind(&professor.last_name)
        .bind(&professor.email)
        .bind(professor.contract_type.as_token())
        .bind(professor.status.as_token())
        .bind(professor.hire_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec.map(|r| RecordId(r.get::<i64, _>(0))))
    }

    pub async fn get_professor(&self, national_id: &str) -> Result<Option<ProfessorRecord>> {
        let row = sqlx::query(
            r#"
            SELECT national_id, first_name, last_name, email, contract_type, status, hire_date
            FROM professors
            WHERE national_id = ?
            "#,
        )
        .bind(national_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| professor_from_row(&row)).transpose()
    }

    pub async fn list_professors(&self) -> Result<Vec<ProfessorRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT national_id, first_name, last_name, email, contract_type, status, hire_date
            FROM professors
            ORDER BY last_name, first_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(professor_from_row).collect()
    }

    pub async fn insert_aspirant(&self, aspirant: &AspirantRecord) -> Result<RecordId> {
        let rec = sqlx::query(
            r#"
            INSERT INTO aspirants (
                national_id, first_name, last_name, program,
                birth_date, application_date, is_admitted
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id
            "#,
        )
        .bind(&aspirant.national_id)
        .bind(&aspirant.first_name)
        .bind(&aspirant.last_name)
        .bind(&aspirant.program)
        .bind(aspirant.birth_date)
        .bind(aspirant.application_date)
        .bind(aspirant.is_admitted)
        .fetch_one(&self.pool)
        .await?;
        Ok(RecordId(rec.get::<i64, _>(0)))
    }

    pub async fn update_aspirant(&self, aspirant: &AspirantRecord) -> Result<Option<RecordId>> {
        let rec = sqlx::query(
            r#"
            UPDATE aspirants SET
                first_name = ?2,
                last_name = ?3,
                program = ?4,
                birth_date = ?5,
                application_date = ?6,
                is_admitted = ?7,
                updated_at = CURRENT_TIMESTAMP
            WHERE national_id = ?1
            RETURNING id
            "#,
        )
        .bind(&aspirant.national_id)
        .bind(&aspirant.first_name)
        .bind(&aspirant.last_name)
        .bind(&aspirant.program)
        .bind(aspirant.birth_date)
        .bind(aspirant.application_date)
        .bind(aspirant.is_admitted)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec.map(|r| RecordId(r.get::<i64, _>(0))))
    }

    pub async fn get_aspirant(&self, national_id: &str) -> Result<Option<AspirantRecord>> {
        let row = sqlx::query(
            r#"
            SELECT national_id, first_name, last_name, program,
                   birth_date, application_date, is_admitted
            FROM aspirants
            WHERE national_id = ?
            "#,
        )
        .bind(national_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| aspirant_from_row(&row)).transpose()
    }

    pub async fn list_aspirants(&self) -> Result<Vec<AspirantRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT national_id, first_name, last_name, program,
                   birth_date, application_date, is_admitted
            FROM aspirants
            ORDER BY application_date, last_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(aspirant_from_row).collect()
    }
}

fn token<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .with_context(|| format!("invalid stored value for column '{column}'"))
}

fn period_from_row(row: &SqliteRow) -> Result<PeriodRecord> {
    Ok(PeriodRecord {
        code: row.try_get("code")?,
        name: row.try_get("name")?,
        year: row.try_get("year")?,
        trimester: token::<Trimester>(row, "trimester")?,
        start_date: row.try_get::<NaiveDate, _>("start_date")?,
        end_date: row.try_get::<NaiveDate, _>("end_date")?,
        enrollment_start: row.try_get::<NaiveDate, _>("enrollment_start")?,
        enrollment_end: row.try_get::<NaiveDate, _>("enrollment_end")?,
        is_active: row.try_get("is_active")?,
    })
}

fn professor_from_row(row: &SqliteRow) -> Result<ProfessorRecord> {
    Ok(ProfessorRecord {
        national_id: row.try_get("national_id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        contract_type: token::<ContractType>(row, "contract_type")?,
        status: token::<ProfessorStatus>(row, "status")?,
        hire_date: row.try_get::<NaiveDate, _>("hire_date")?,
    })
}

fn aspirant_from_row(row: &SqliteRow) -> Result<AspirantRecord> {
    Ok(AspirantRecord {
        national_id: row.try_get("national_id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        program: row.try_get("program")?,
        birth_date: row.try_get::<NaiveDate, _>("birth_date")?,
        application_date: row.try_get::<NaiveDate, _>("application_date")?,
        is_admitted: row.try_get("is_admitted")?,
    })
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}

/// Maps an insert/update result onto what the form controller branches on.
fn save_outcome<E: FormEntity>(
    key: &str,
    mode: SaveMode,
    result: Result<Option<RecordId>>,
) -> Result<SaveOutcome> {
    match result {
        Ok(Some(id)) => {
            debug!(kind = E::KIND, key, %id, ?mode, "record stored");
            Ok(SaveOutcome::saved(id))
        }
        Ok(None) => {
            warn!(kind = E::KIND, key, "update target missing");
            Ok(SaveOutcome::rejected(format!(
                "No existe un registro con el identificador {key}"
            )))
        }
        Err(err) if is_unique_violation(&err) => {
            warn!(kind = E::KIND, key, "duplicate record rejected");
            Ok(SaveOutcome::rejected(format!(
                "Ya existe un registro con el identificador {key}"
            )))
        }
        Err(err) => Err(err.context(format!("failed to store {} '{key}'", E::KIND))),
    }
}

#[async_trait]
impl Gateway<Period> for Storage {
    async fn save(&self, record: PeriodRecord, mode: SaveMode) -> Result<SaveOutcome> {
        let result = match mode {
            SaveMode::Create => self.insert_period(&record).await.map(Some),
            SaveMode::Update => self.update_period(&record).await,
        };
        save_outcome::<Period>(&record.code, mode, result)
    }
}

#[async_trait]
impl Gateway<Professor> for Storage {
    async fn save(&self, record: ProfessorRecord, mode: SaveMode) -> Result<SaveOutcome> {
        let result = match mode {
            SaveMode::Create => self.insert_professor(&record).await.map(Some),
            SaveMode::Update => self.update_professor(&record).await,
        };
        save_outcome::<Professor>(&record.national_id, mode, result)
    }
}

#[async_trait]
impl Gateway<Aspirant> for Storage {
    async fn save(&self, record: AspirantRecord, mode: SaveMode) -> Result<SaveOutcome> {
        let result = match mode {
            SaveMode::Create => self.insert_aspirant(&record).await.map(Some),
            SaveMode::Update => self.update_aspirant(&record).await,
        };
        save_outcome::<Aspirant>(&record.national_id, mode, result)
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
