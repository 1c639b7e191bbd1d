use std::sync::OnceLock;

use shared::{
    domain::Aspirant,
    protocol::{AspirantRecord, SaveMode},
};

use super::{FormEntity, EPOCH, NATIONAL_ID_MESSAGE, NATIONAL_ID_PATTERN};
use crate::{
    fields::FormFields,
    schema::{CrossFieldRule, FieldSpec, Schema, ValidatedFields, ValidationErrors},
};

impl FormEntity for Aspirant {
    type Record = AspirantRecord;

    const KIND: &'static str = "aspirant";

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new()
                .field(FieldSpec::pattern(
                    "national_id",
                    "La cédula",
                    NATIONAL_ID_PATTERN,
                    NATIONAL_ID_MESSAGE,
                ))
                .field(FieldSpec::text("first_name", "El nombre", 2))
                .field(FieldSpec::text("last_name", "El apellido", 2))
                .field(FieldSpec::text("program", "El programa", 3))
                .field(FieldSpec::date("birth_date", "La fecha de nacimiento"))
                .field(FieldSpec::date_not_before(
                    "application_date",
                    "La fecha de postulación",
                    EPOCH,
                ))
                .field(FieldSpec::flag("is_admitted", "Admitido", false))
                .cross(CrossFieldRule::date_after(
                    "application_date",
                    "birth_date",
                    "La fecha de postulación debe ser posterior a la fecha de nacimiento",
                ))
        })
    }

    fn defaults() -> FormFields {
        FormFields::new().with("is_admitted", false)
    }

    fn from_validated(fields: &ValidatedFields) -> Result<Self, ValidationErrors> {
        Ok(Self {
            national_id: fields.text("national_id")?.to_string(),
            first_name: fields.text("first_name")?.to_string(),
            last_name: fields.text("last_name")?.to_string(),
            program: fields.text("program")?.to_string(),
            birth_date: fields.date("birth_date")?,
            application_date: fields.date("application_date")?,
            is_admitted: fields.flag("is_admitted")?,
        })
    }

    fn to_fields(&self) -> FormFields {
        FormFields::new()
            .with("national_id", self.national_id.as_str())
            .with("first_name", self.first_name.as_str())
            .with("last_name", self.last_name.as_str())
            .with("program", self.program.as_str())
            .with("birth_date", self.birth_date)
            .with("application_date", self.application_date)
            .with("is_admitted", self.is_admitted)
    }

    fn to_record(&self) -> AspirantRecord {
        AspirantRecord::from(self)
    }

    fn record_key(record: &AspirantRecord) -> String {
        record.national_id.clone()
    }

    fn success_message(mode: SaveMode) -> &'static str {
        match mode {
            SaveMode::Create => "Aspirante registrado correctamente",
            SaveMode::Update => "Aspirante actualizado correctamente",
        }
    }
}
