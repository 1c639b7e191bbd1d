//! Structured form submission: declarative validation, a single-flight submission
//! controller, and the persistence and notification seams it talks to.

pub mod controller;
pub mod entities;
pub mod fields;
pub mod gateway;
pub mod notify;
pub mod schema;

pub use controller::{
    FormConfig, FormController, FormError, FormMode, FormStatus, SubmitOutcome, SubmitPhase,
};
pub use entities::{validate, FormEntity, EPOCH};
pub use fields::{FieldValue, FormFields};
pub use gateway::{Gateway, GatewayCall, MemoryGateway};
pub use notify::{BroadcastNotifier, Notification, NotificationKind, Notifier, TracingNotifier};
pub use schema::{
    CrossFieldRule, FieldRule, FieldSpec, FieldViolation, Schema, TypedValue, ValidatedFields,
    ValidationErrors, ViolationKind,
};
