use super::*;

fn sample_period() -> Period {
    Period {
        id: "2024-T1".into(),
        name: "Trimester I 2024".into(),
        year: 2024,
        trimester: Trimester::First,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
        end_date: NaiveDate::from_ymd_opt(2024, 4, 1).expect("date"),
        enrollment_start: NaiveDate::from_ymd_opt(2023, 12, 15).expect("date"),
        enrollment_end: NaiveDate::from_ymd_opt(2023, 12, 22).expect("date"),
        is_active: false,
    }
}

#[test]
fn period_record_carries_id_as_code() {
    let record = PeriodRecord::from(&sample_period());
    assert_eq!(record.code, "2024-T1");

    let json = serde_json::to_value(&record).expect("json");
    assert_eq!(json["code"], "2024-T1");
    assert!(json.get("id").is_none());
    assert_eq!(json["trimester"], "1");
}

#[test]
fn period_record_converts_back_to_entity() {
    let period = sample_period();
    assert_eq!(Period::from(PeriodRecord::from(&period)), period);
}

#[test]
fn save_outcome_serializes_with_status_tag() {
    let saved = serde_json::to_value(SaveOutcome::saved(7)).expect("json");
    assert_eq!(saved["status"], "saved");
    assert_eq!(saved["id"], "7");

    let rejected = SaveOutcome::Rejected { reason: None };
    let json = serde_json::to_value(&rejected).expect("json");
    assert_eq!(json["status"], "rejected");
    assert!(json.get("reason").is_none());
    assert!(!rejected.is_saved());
}

#[test]
fn tokens_round_trip_through_from_str() {
    assert_eq!("part-time".parse::<ContractType>(), Ok(ContractType::PartTime));
    assert_eq!(ProfessorStatus::Sabbatical.as_token(), "sabbatical");
    assert_eq!(Trimester::TOKENS, &["1", "2", "3"]);

    let err = "4".parse::<Trimester>().expect_err("unknown trimester");
    assert_eq!(err.token, "4");
    assert_eq!(err.kind, "Trimester");
}
