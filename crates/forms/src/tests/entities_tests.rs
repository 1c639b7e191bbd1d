use super::*;
use shared::domain::{Aspirant, ContractType, Period, Professor, ProfessorStatus, Trimester};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date")
}

fn period_fields() -> FormFields {
    Period::defaults()
        .with("id", "2024-T1")
        .with("name", "Trimester I 2024")
        .with("year", 2024)
        .with("trimester", "1")
        .with("start_date", "2024-01-01")
        .with("end_date", "2024-04-01")
        .with("enrollment_start", "2023-12-15")
        .with("enrollment_end", "2023-12-22")
}

fn professor_fields() -> FormFields {
    Professor::defaults()
        .with("national_id", "V-12345678")
        .with("first_name", "Ana")
        .with("last_name", "Pérez")
        .with("email", "ana.perez@example.edu")
        .with("hire_date", "2015-09-01")
}

fn aspirant_fields() -> FormFields {
    Aspirant::defaults()
        .with("national_id", "E-1234567")
        .with("first_name", "Luis")
        .with("last_name", "Mora")
        .with("program", "Ingeniería")
        .with("birth_date", "2004-05-10")
        .with("application_date", "2024-02-01")
}

#[test]
fn period_scenario_validates_into_entity() {
    let period = validate::<Period>(&period_fields()).expect("valid period");
    assert_eq!(period.id, "2024-T1");
    assert_eq!(period.year, 2024);
    assert_eq!(period.trimester, Trimester::First);
    assert_eq!(period.enrollment_end, date(2023, 12, 22));
    assert!(!period.is_active);
}

#[test]
fn period_record_renames_id_to_code() {
    let period = validate::<Period>(&period_fields()).expect("valid period");
    let record = period.to_record();
    assert_eq!(record.code, "2024-T1");
    assert_eq!(Period::record_key(&record), "2024-T1");
}

#[test]
fn period_with_end_equal_to_start_fails_on_end_date() {
    let fields = period_fields().with("end_date", "2024-01-01");
    let errors = validate::<Period>(&fields).expect_err("equal dates");
    assert_eq!(errors.len(), 1);
    let violation = errors.for_field("end_date").expect("end_date");
    assert_eq!(violation.kind, ViolationKind::CrossField);
}

#[test]
fn period_enrollment_window_must_be_ordered() {
    let fields = period_fields().with("enrollment_end", "2023-12-15");
    let errors = validate::<Period>(&fields).expect_err("equal enrollment dates");
    assert!(errors.has_field("enrollment_end"));
    assert!(!errors.has_field("end_date"));
}

#[test]
fn period_rejects_unknown_trimester_and_early_dates() {
    let fields = period_fields()
        .with("trimester", "4")
        .with("start_date", "1999-12-31");
    let errors = validate::<Period>(&fields).expect_err("invalid");
    assert_eq!(
        errors.for_field("trimester").map(|v| v.kind),
        Some(ViolationKind::NotAllowed)
    );
    assert_eq!(
        errors.for_field("start_date").map(|v| v.kind),
        Some(ViolationKind::BeforeEpoch)
    );
}

#[test]
fn period_defaults_only_carry_the_active_flag() {
    let defaults = Period::defaults();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults.get("is_active"), Some(&crate::fields::FieldValue::Bool(false)));

    let errors = validate::<Period>(&defaults).expect_err("empty form");
    assert_eq!(errors.len(), 8);
    assert!(errors.iter().all(|v| v.kind == ViolationKind::Required));
}

#[test]
fn period_edit_fields_validate_back_to_the_same_entity() {
    let period = validate::<Period>(&period_fields()).expect("valid period");
    let reloaded = validate::<Period>(&period.to_fields()).expect("edit mapping");
    assert_eq!(reloaded, period);
}

#[test]
fn professor_uses_defaults_for_contract_and_status() {
    let professor = validate::<Professor>(&professor_fields()).expect("valid professor");
    assert_eq!(professor.contract_type, ContractType::FullTime);
    assert_eq!(professor.status, ProfessorStatus::Active);
    assert_eq!(professor.to_record().national_id, "V-12345678");
}

#[test]
fn professor_rejects_bad_id_email_and_status() {
    let fields = professor_fields()
        .with("national_id", "V-12")
        .with("email", "ana@")
        .with("status", "retired");
    let errors = validate::<Professor>(&fields).expect_err("invalid");
    assert_eq!(
        errors.for_field("national_id").map(|v| v.message.as_str()),
        Some(NATIONAL_ID_MESSAGE)
    );
    assert!(errors.has_field("email"));
    assert!(errors.has_field("status"));
}

#[test]
fn professor_hire_date_respects_epoch() {
    let fields = professor_fields().with("hire_date", "1998-01-01");
    let errors = validate::<Professor>(&fields).expect_err("early hire");
    assert_eq!(
        errors.for_field("hire_date").map(|v| v.kind),
        Some(ViolationKind::BeforeEpoch)
    );
}

#[test]
fn aspirant_application_must_follow_birth() {
    let aspirant = validate::<Aspirant>(&aspirant_fields()).expect("valid aspirant");
    assert!(!aspirant.is_admitted);

    let fields = aspirant_fields().with("birth_date", "2024-02-01");
    let errors = validate::<Aspirant>(&fields).expect_err("same day");
    assert_eq!(
        errors.for_field("application_date").map(|v| v.kind),
        Some(ViolationKind::CrossField)
    );
}

#[test]
fn success_messages_differ_by_mode() {
    assert_eq!(
        Period::success_message(SaveMode::Create),
        "Período registrado correctamente"
    );
    assert_ne!(
        Period::success_message(SaveMode::Create),
        Period::success_message(SaveMode::Update)
    );
    assert_ne!(
        Professor::success_message(SaveMode::Create),
        Aspirant::success_message(SaveMode::Create)
    );
}
