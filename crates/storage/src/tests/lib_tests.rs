use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date")
}

fn period(code: &str) -> PeriodRecord {
    PeriodRecord {
        code: code.into(),
        name: "Trimester I 2024".into(),
        year: 2024,
        trimester: Trimester::First,
        start_date: date(2024, 1, 1),
        end_date: date(2024, 4, 1),
        enrollment_start: date(2023, 12, 15),
        enrollment_end: date(2023, 12, 22),
        is_active: false,
    }
}

fn professor(national_id: &str) -> ProfessorRecord {
    ProfessorRecord {
        national_id: national_id.into(),
        first_name: "Ana".into(),
        last_name: "Pérez".into(),
        email: "ana.perez@example.edu".into(),
        contract_type: ContractType::PartTime,
        status: ProfessorStatus::Sabbatical,
        hire_date: date(2015, 9, 1),
    }
}

fn aspirant(national_id: &str) -> AspirantRecord {
    AspirantRecord {
        national_id: national_id.into(),
        first_name: "Luis".into(),
        last_name: "Mora".into(),
        program: "Ingeniería".into(),
        birth_date: date(2004, 5, 10),
        application_date: date(2024, 2, 1),
        is_admitted: true,
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("forms_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("storage.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn stores_and_reads_back_periods() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let id = storage.insert_period(&period("2024-T1")).await.expect("insert");
    assert!(id.0 > 0);

    let stored = storage
        .get_period("2024-T1")
        .await
        .expect("get")
        .expect("period exists");
    assert_eq!(stored, period("2024-T1"));
    assert!(storage.get_period("2030-T9").await.expect("get").is_none());
}

#[tokio::test]
async fn duplicate_period_code_is_a_unique_violation() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.insert_period(&period("2024-T1")).await.expect("insert");

    let err = storage
        .insert_period(&period("2024-T1"))
        .await
        .expect_err("duplicate");
    assert!(is_unique_violation(&err));
}

#[tokio::test]
async fn updates_period_by_code() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let id = storage.insert_period(&period("2024-T1")).await.expect("insert");

    let mut changed = period("2024-T1");
    changed.is_active = true;
    changed.trimester = Trimester::Second;
    let updated = storage.update_period(&changed).await.expect("update");
    assert_eq!(updated, Some(id));
    assert_eq!(
        storage.get_period("2024-T1").await.expect("get"),
        Some(changed)
    );

    let missing = storage
        .update_period(&period("2030-T1"))
        .await
        .expect("update");
    assert_eq!(missing, None);
}

#[tokio::test]
async fn lists_periods_newest_first() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut older = period("2023-T3");
    older.year = 2023;
    older.trimester = Trimester::Third;
    storage.insert_period(&older).await.expect("older");
    storage.insert_period(&period("2024-T1")).await.expect("newer");

    let codes: Vec<_> = storage
        .list_periods()
        .await
        .expect("list")
        .into_iter()
        .map(|p| p.code)
        .collect();
    assert_eq!(codes, vec!["2024-T1", "2023-T3"]);
}

#[tokio::test]
async fn stores_professors_and_aspirants() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_professor(&professor("V-12345678"))
        .await
        .expect("professor");
    storage
        .insert_aspirant(&aspirant("E-1234567"))
        .await
        .expect("aspirant");

    assert_eq!(
        storage.get_professor("V-12345678").await.expect("get"),
        Some(professor("V-12345678"))
    );
    assert_eq!(storage.list_aspirants().await.expect("list"), vec![aspirant("E-1234567")]);

    let mut retired = professor("V-12345678");
    retired.status = ProfessorStatus::Inactive;
    storage.update_professor(&retired).await.expect("update");
    assert_eq!(
        storage.list_professors().await.expect("list")[0].status,
        ProfessorStatus::Inactive
    );
}

#[tokio::test]
async fn gateway_maps_duplicates_and_missing_rows_to_rejections() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    let created = Gateway::<Period>::save(&storage, period("2024-T1"), SaveMode::Create)
        .await
        .expect("create");
    assert!(created.is_saved());

    let duplicate = Gateway::<Period>::save(&storage, period("2024-T1"), SaveMode::Create)
        .await
        .expect("duplicate is not a fault");
    assert_eq!(
        duplicate,
        SaveOutcome::rejected("Ya existe un registro con el identificador 2024-T1")
    );

    let missing = Gateway::<Aspirant>::save(&storage, aspirant("V-7654321"), SaveMode::Update)
        .await
        .expect("missing is not a fault");
    assert!(!missing.is_saved());
}

#[tokio::test]
async fn gateway_reports_database_failures_as_faults() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    sqlx::query("DROP TABLE professors")
        .execute(storage.pool())
        .await
        .expect("drop table");

    let err = Gateway::<Professor>::save(&storage, professor("V-12345678"), SaveMode::Create)
        .await
        .expect_err("fault");
    assert!(format!("{err:#}").contains("failed to store professor 'V-12345678'"));
}

#[test]
fn sqlite_path_skips_memory_databases() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/forms.db?mode=rwc"),
        Some(PathBuf::from("./data/forms.db"))
    );
}
