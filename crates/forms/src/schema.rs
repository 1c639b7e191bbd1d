//! Declarative field validation.
//!
//! A [`Schema`] is an ordered list of per-field rules followed by an ordered list of
//! cross-field rules. Validation runs them as two separate passes: every field is
//! checked and coerced on its own first, then each cross-field predicate sees the typed
//! values from that first pass. A cross-field rule whose referenced fields are missing
//! or already rejected is skipped, so a field never reports both "required" and an
//! ordering violation.

use std::{collections::BTreeMap, fmt};

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::fields::{FieldValue, FormFields};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub enum FieldRule {
    Text { min_len: usize },
    Choice { allowed: &'static [&'static str] },
    Pattern { pattern: Regex, message: String },
    Integer { min: i64, max: i64 },
    Date { not_before: Option<NaiveDate> },
    Flag { default: bool },
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    label: &'static str,
    rule: FieldRule,
    required: bool,
}

impl FieldSpec {
    pub fn new(name: &'static str, label: &'static str, rule: FieldRule) -> Self {
        let required = !matches!(rule, FieldRule::Flag { .. });
        Self {
            name,
            label,
            rule,
            required,
        }
    }

    pub fn text(name: &'static str, label: &'static str, min_len: usize) -> Self {
        Self::new(name, label, FieldRule::Text { min_len })
    }

    pub fn choice(
        name: &'static str,
        label: &'static str,
        allowed: &'static [&'static str],
    ) -> Self {
        Self::new(name, label, FieldRule::Choice { allowed })
    }

    /// Panics if `pattern` is not a valid regex; schemas are built from literals.
    pub fn pattern(
        name: &'static str,
        label: &'static str,
        pattern: &str,
        message: impl Into<String>,
    ) -> Self {
        let pattern = Regex::new(pattern).expect("schema pattern must be a valid regex");
        Self::new(
            name,
            label,
            FieldRule::Pattern {
                pattern,
                message: message.into(),
            },
        )
    }

    pub fn integer(name: &'static str, label: &'static str, min: i64, max: i64) -> Self {
        Self::new(name, label, FieldRule::Integer { min, max })
    }

    pub fn date(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldRule::Date { not_before: None })
    }

    pub fn date_not_before(name: &'static str, label: &'static str, epoch: NaiveDate) -> Self {
        Self::new(
            name,
            label,
            FieldRule::Date {
                not_before: Some(epoch),
            },
        )
    }

    pub fn flag(name: &'static str, label: &'static str, default: bool) -> Self {
        Self::new(name, label, FieldRule::Flag { default })
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn check(&self, raw: Option<&FieldValue>) -> Result<Option<TypedValue>, FieldViolation> {
        if let FieldRule::Flag { default } = self.rule {
            return match raw {
                None => Ok(Some(TypedValue::Flag(default))),
                Some(FieldValue::Bool(value)) => Ok(Some(TypedValue::Flag(*value))),
                Some(FieldValue::Text(text)) => match text.trim() {
                    "" => Ok(Some(TypedValue::Flag(default))),
                    "true" => Ok(Some(TypedValue::Flag(true))),
                    "false" => Ok(Some(TypedValue::Flag(false))),
                    _ => Err(self.type_violation("verdadero o falso")),
                },
                Some(_) => Err(self.type_violation("verdadero o falso")),
            };
        }

        let raw = match raw {
            None => None,
            Some(FieldValue::Text(text)) if text.trim().is_empty() => None,
            Some(value) => Some(value),
        };
        let Some(raw) = raw else {
            return if self.required {
                Err(self.violation(
                    ViolationKind::Required,
                    format!("{} es obligatorio", self.label),
                ))
            } else {
                Ok(None)
            };
        };

        match &self.rule {
            FieldRule::Text { min_len } => {
                let Some(text) = as_text(raw) else {
                    return Err(self.type_violation("texto"));
                };
                let text = text.trim();
                if text.chars().count() < *min_len {
                    return Err(self.violation(
                        ViolationKind::TooShort,
                        format!(
                            "{} debe tener al menos {min_len} caracteres",
                            self.label
                        ),
                    ));
                }
                Ok(Some(TypedValue::Text(text.to_string())))
            }
            FieldRule::Choice { allowed } => {
                let token = match raw {
                    FieldValue::Text(text) => text.trim().to_string(),
                    FieldValue::Number(number) => match integral(*number) {
                        Some(number) => number.to_string(),
                        None => return Err(self.not_allowed(allowed)),
                    },
                    _ => return Err(self.not_allowed(allowed)),
                };
                if !allowed.contains(&token.as_str()) {
                    return Err(self.not_allowed(allowed));
                }
                Ok(Some(TypedValue::Text(token)))
            }
            FieldRule::Pattern { pattern, message } => {
                let Some(text) = as_text(raw) else {
                    return Err(self.type_violation("texto"));
                };
                let text = text.trim();
                if !pattern.is_match(text) {
                    return Err(self.violation(ViolationKind::Pattern, message.clone()));
                }
                Ok(Some(TypedValue::Text(text.to_string())))
            }
            FieldRule::Integer { min, max } => {
                let number = match raw {
                    FieldValue::Number(number) => integral(*number),
                    FieldValue::Text(text) => coerce_integer(text.trim()),
                    _ => None,
                };
                let Some(number) = number else {
                    return Err(self.type_violation("un número entero"));
                };
                if number < *min || number > *max {
                    return Err(self.violation(
                        ViolationKind::OutOfRange,
                        format!("{} debe estar entre {min} y {max}", self.label),
                    ));
                }
                Ok(Some(TypedValue::Integer(number)))
            }
            FieldRule::Date { not_before } => {
                let date = match raw {
                    FieldValue::Date(date) => Some(*date),
                    FieldValue::Text(text) => {
                        NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
                    }
                    _ => None,
                };
                let Some(date) = date else {
                    return Err(self.type_violation("una fecha válida (AAAA-MM-DD)"));
                };
                if let Some(epoch) = not_before {
                    if date < *epoch {
                        return Err(self.violation(
                            ViolationKind::BeforeEpoch,
                            format!(
                                "{} no puede ser anterior al {}",
                                self.label,
                                epoch.format(DATE_FORMAT)
                            ),
                        ));
                    }
                }
                Ok(Some(TypedValue::Date(date)))
            }
            FieldRule::Flag { .. } => unreachable!("flags are handled before presence checks"),
        }
    }

    fn violation(&self, kind: ViolationKind, message: String) -> FieldViolation {
        FieldViolation {
            field: self.name.to_string(),
            kind,
            message,
        }
    }

    fn type_violation(&self, expected: &str) -> FieldViolation {
        self.violation(
            ViolationKind::Type,
            format!("{} debe ser {expected}", self.label),
        )
    }

    fn not_allowed(&self, allowed: &[&str]) -> FieldViolation {
        self.violation(
            ViolationKind::NotAllowed,
            format!("{} debe ser uno de: {}", self.label, allowed.join(", ")),
        )
    }
}

/// Text view of a raw value; the untagged mapping may have typed a text field as a
/// number or a date.
fn as_text(raw: &FieldValue) -> Option<String> {
    match raw {
        FieldValue::Text(text) => Some(text.clone()),
        FieldValue::Number(number) => integral(*number).map(|number| number.to_string()),
        FieldValue::Date(date) => Some(date.format(DATE_FORMAT).to_string()),
        FieldValue::Bool(_) => None,
    }
}

fn integral(number: f64) -> Option<i64> {
    (number.is_finite() && number.fract() == 0.0 && number.abs() <= i64::MAX as f64)
        .then_some(number as i64)
}

fn coerce_integer(text: &str) -> Option<i64> {
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().and_then(integral))
}

type Predicate = dyn Fn(&ValidatedFields) -> bool + Send + Sync;

/// A predicate over several fields of the same entity, reported against `target`.
pub struct CrossFieldRule {
    target: &'static str,
    references: Vec<&'static str>,
    message: String,
    predicate: Box<Predicate>,
}

impl CrossFieldRule {
    pub fn new(
        target: &'static str,
        references: &[&'static str],
        message: impl Into<String>,
        predicate: impl Fn(&ValidatedFields) -> bool + Send + Sync + 'static,
    ) -> Self {
        let mut references = references.to_vec();
        if !references.contains(&target) {
            references.push(target);
        }
        Self {
            target,
            references,
            message: message.into(),
            predicate: Box::new(predicate),
        }
    }

    /// `later` must fall strictly after `earlier`; equal dates are rejected.
    pub fn date_after(
        later: &'static str,
        earlier: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::new(later, &[earlier], message, move |fields| {
            match (fields.date(later), fields.date(earlier)) {
                (Ok(later), Ok(earlier)) => later > earlier,
                _ => true,
            }
        })
    }

    pub fn references(&self) -> &[&'static str] {
        &self.references
    }
}

impl fmt::Debug for CrossFieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossFieldRule")
            .field("target", &self.target)
            .field("references", &self.references)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    cross_rules: Vec<CrossFieldRule>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn cross(mut self, rule: CrossFieldRule) -> Self {
        self.cross_rules.push(rule);
        self
    }

    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.spec(name).is_some()
    }

    pub fn cross_rules(&self) -> &[CrossFieldRule] {
        &self.cross_rules
    }

    /// Validates a possibly partial mapping. Fields the schema does not declare are ignored.
    pub fn validate(&self, input: &FormFields) -> Result<ValidatedFields, ValidationErrors> {
        let mut typed = ValidatedFields::default();
        let mut errors = ValidationErrors::default();

        for spec in &self.fields {
            match spec.check(input.get(spec.name)) {
                Ok(Some(value)) => {
                    typed.values.insert(spec.name, value);
                }
                Ok(None) => {}
                Err(violation) => errors.push(violation),
            }
        }

        for rule in &self.cross_rules {
            let ready = rule
                .references
                .iter()
                .all(|name| typed.values.contains_key(name));
            if ready && !(rule.predicate)(&typed) {
                errors.push(FieldViolation {
                    field: rule.target.to_string(),
                    kind: ViolationKind::CrossField,
                    message: rule.message.clone(),
                });
            }
        }

        if errors.is_empty() {
            Ok(typed)
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    Flag(bool),
}

/// Coerced values for every field that passed its own rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedFields {
    values: BTreeMap<&'static str, TypedValue>,
}

impl ValidatedFields {
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Result<&str, ValidationErrors> {
        match self.values.get(name) {
            Some(TypedValue::Text(text)) => Ok(text),
            _ => Err(ValidationErrors::missing(name)),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64, ValidationErrors> {
        match self.values.get(name) {
            Some(TypedValue::Integer(number)) => Ok(*number),
            _ => Err(ValidationErrors::missing(name)),
        }
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate, ValidationErrors> {
        match self.values.get(name) {
            Some(TypedValue::Date(date)) => Ok(*date),
            _ => Err(ValidationErrors::missing(name)),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool, ValidationErrors> {
        match self.values.get(name) {
            Some(TypedValue::Flag(flag)) => Ok(*flag),
            _ => Err(ValidationErrors::missing(name)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Required,
    TooShort,
    NotAllowed,
    Pattern,
    Type,
    OutOfRange,
    BeforeEpoch,
    CrossField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for violation in &self.violations {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn single(field: &str, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.to_string(),
                kind,
                message: message.into(),
            }],
        }
    }

    fn missing(name: &str) -> Self {
        Self::single(
            name,
            ViolationKind::Type,
            format!("{name} no tiene un valor validado"),
        )
    }

    pub fn push(&mut self, violation: FieldViolation) {
        self.violations.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldViolation> {
        self.violations.iter()
    }

    /// First violation reported for `field`, per-field rules before cross-field rules.
    pub fn for_field(&self, field: &str) -> Option<&FieldViolation> {
        self.violations.iter().find(|v| v.field == field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.for_field(field).is_some()
    }

    pub fn clear_field(&mut self, field: &str) {
        self.violations.retain(|v| v.field != field);
    }
}

#[cfg(test)]
#[path = "tests/schema_tests.rs"]
mod tests;
