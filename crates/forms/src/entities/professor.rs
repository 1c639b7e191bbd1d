use std::sync::OnceLock;

use shared::{
    domain::{ContractType, Professor, ProfessorStatus},
    protocol::{ProfessorRecord, SaveMode},
};

use super::{parse_token, FormEntity, EPOCH, NATIONAL_ID_MESSAGE, NATIONAL_ID_PATTERN};
use crate::{
    fields::FormFields,
    schema::{FieldSpec, Schema, ValidatedFields, ValidationErrors},
};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

impl FormEntity for Professor {
    type Record = ProfessorRecord;

    const KIND: &'static str = "professor";

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
                .field(FieldSpec::pattern(
                    "email",
                    "El correo",
                    EMAIL_PATTERN,
                    "El correo electrónico no es válido",
                ))
                .field(FieldSpec::choice(
                    "contract_type",
                    "El tipo de contrato",
                    ContractType::TOKENS,
                ))
                .field(FieldSpec::choice(
                    "status",
                    "El estatus",
                    ProfessorStatus::TOKENS,
                ))
                .field(FieldSpec::date_not_before(
                    "hire_date",
                    "La fecha de ingreso",
                    EPOCH,
                ))
        })
    }

    fn defaults() -> FormFields {
        FormFields::new()
            .with("contract_type", ContractType::FullTime.as_token())
            .with("status", ProfessorStatus::Active.as_token())
    }

    fn from_validated(fields: &ValidatedFields) -> Result<Self, ValidationErrors> {
        Ok(Self {
            national_id: fields.text("national_id")?.to_string(),
            first_name: fields.text("first_name")?.to_string(),
            last_name: fields.text("last_name")?.to_string(),
            email: fields.text("email")?.to_string(),
            contract_type: parse_token(fields, "contract_type")?,
            status: parse_token(fields, "status")?,
            hire_date: fields.date("hire_date")?,
        })
    }

    fn to_fields(&self) -> FormFields {
        FormFields::new()
            .with("national_id", self.national_id.as_str())
            .with("first_name", self.first_name.as_str())
            .with("last_name", self.last_name.as_str())
            .with("email", self.email.as_str())
            .with("contract_type", self.contract_type.as_token())
            .with("status", self.status.as_token())
            .with("hire_date", self.hire_date)
    }

    fn to_record(&self) -> ProfessorRecord {
        ProfessorRecord::from(self)
    }

    fn record_key(record: &ProfessorRecord) -> String {
        record.national_id.clone()
    }

    fn success_message(mode: SaveMode) -> &'static str {
        match mode {
            SaveMode::Create => "Profesor registrado correctamente",
            SaveMode::Update => "Profesor actualizado correctamente",
        }
    }
}
