use std::sync::OnceLock;

use shared::{
    domain::{Period, Trimester},
    protocol::{PeriodRecord, SaveMode},
};

use super::{parse_token, FormEntity, EPOCH};
use crate::{
    fields::FormFields,
    schema::{CrossFieldRule, FieldSpec, Schema, ValidatedFields, ValidationErrors, ViolationKind},
};

impl FormEntity for Period {
    type Record = PeriodRecord;

    const KIND: &'static str = "period";

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new()
                .field(FieldSpec::text("id", "El código del período", 3))
                .field(FieldSpec::text("name", "El nombre", 3))
                .field(FieldSpec::integer("year", "El año", 2000, 2100))
                .field(FieldSpec::choice(
                    "trimester",
                    "El trimestre",
                    Trimester::TOKENS,
                ))
                .field(FieldSpec::date_not_before(
                    "start_date",
                    "La fecha de inicio",
                    EPOCH,
                ))
                .field(FieldSpec::date_not_before(
                    "end_date",
                    "La fecha de fin",
                    EPOCH,
                ))
                .field(FieldSpec::date_not_before(
                    "enrollment_start",
                    "El inicio de inscripciones",
                    EPOCH,
                ))
                .field(FieldSpec::date_not_before(
                    "enrollment_end",
                    "El fin de inscripciones",
                    EPOCH,
                ))
                .field(FieldSpec::flag("is_active", "Activo", false))
                .cross(CrossFieldRule::date_after(
                    "end_date",
                    "start_date",
                    "La fecha de fin debe ser posterior a la fecha de inicio",
                ))
                .cross(CrossFieldRule::date_after(
                    "enrollment_end",
                    "enrollment_start",
                    "El fin de inscripciones debe ser posterior al inicio de inscripciones",
                ))
        })
    }

    fn defaults() -> FormFields {
        FormFields::new().with("is_active", false)
    }

    fn from_validated(fields: &ValidatedFields) -> Result<Self, ValidationErrors> {
        let year = i32::try_from(fields.integer("year")?).map_err(|_| {
            ValidationErrors::single("year", ViolationKind::OutOfRange, "El año no es válido")
        })?;

        Ok(Self {
            id: fields.text("id")?.to_string(),
            name: fields.text("name")?.to_string(),
            year,
            trimester: parse_token(fields, "trimester")?,
            start_date: fields.date("start_date")?,
            end_date: fields.date("end_date")?,
            enrollment_start: fields.date("enrollment_start")?,
            enrollment_end: fields.date("enrollment_end")?,
            is_active: fields.flag("is_active")?,
        })
    }

    fn to_fields(&self) -> FormFields {
        FormFields::new()
            .with("id", self.id.as_str())
            .with("name", self.name.as_str())
            .with("year", self.year)
            .with("trimester", self.trimester.as_token())
            .with("start_date", self.start_date)
            .with("end_date", self.end_date)
            .with("enrollment_start", self.enrollment_start)
            .with("enrollment_end", self.enrollment_end)
            .with("is_active", self.is_active)
    }

    fn to_record(&self) -> PeriodRecord {
        PeriodRecord::from(self)
    }

    fn record_key(record: &PeriodRecord) -> String {
        record.code.clone()
    }

    fn success_message(mode: SaveMode) -> &'static str {
        match mode {
            SaveMode::Create => "Período registrado correctamente",
            SaveMode::Update => "Período actualizado correctamente",
        }
    }
}
