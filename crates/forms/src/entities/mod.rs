//! Per-entity schemas and the glue between validated fields, entities and gateway records.

mod aspirant;
mod period;
mod professor;

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use shared::protocol::SaveMode;

use crate::{
    fields::FormFields,
    schema::{Schema, ValidatedFields, ValidationErrors, ViolationKind},
};

/// Earliest date any institutional record may carry.
pub const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2000, 1, 1) {
    Some(date) => date,
    None => panic!("epoch must be a valid date"),
};

pub(crate) const NATIONAL_ID_PATTERN: &str = r"^[VE]-\d{7,8}$";
pub(crate) const NATIONAL_ID_MESSAGE: &str =
    "La cédula debe tener el formato V-1234567 o E-1234567";

/// An entity a form can produce.
pub trait FormEntity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Shape handed to the persistence gateway.
    type Record: Clone + fmt::Debug + Send + Sync + 'static;

    const KIND: &'static str;

    fn schema() -> &'static Schema;

    /// Mapping a create-mode form starts from.
    fn defaults() -> FormFields;

    fn from_validated(fields: &ValidatedFields) -> Result<Self, ValidationErrors>;

    /// Mapping an edit-mode form starts from.
    fn to_fields(&self) -> FormFields;

    fn to_record(&self) -> Self::Record;

    /// Natural key of a record, used to detect duplicates.
    fn record_key(record: &Self::Record) -> String;

    fn success_message(mode: SaveMode) -> &'static str;
}

/// Runs the entity's schema and builds the typed entity.
pub fn validate<E: FormEntity>(fields: &FormFields) -> Result<E, ValidationErrors> {
    let typed = E::schema().validate(fields)?;
    E::from_validated(&typed)
}

pub(crate) fn parse_token<T>(fields: &ValidatedFields, name: &str) -> Result<T, ValidationErrors>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fields.text(name)?.parse::<T>().map_err(|err| {
        ValidationErrors::single(name, ViolationKind::NotAllowed, err.to_string())
    })
}

#[cfg(test)]
#[path = "../tests/entities_tests.rs"]
mod tests;
