//! Submission controller: validation, one persistence call, feedback, reset.
//!
//! A controller is one form instance. It owns the field mapping and publishes a
//! [`FormStatus`] on a watch channel so whatever renders the form can disable its
//! controls while a submission is in flight. At most one gateway call is in flight
//! per controller; the `Submitting` phase is cleared by a drop guard, so faults,
//! panics inside the gateway and dropped submit futures all leave the form usable.

use std::{fmt, sync::Arc};

use serde::Serialize;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{SaveMode, SaveOutcome},
};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    entities::{self, FormEntity},
    fields::{FieldValue, FormFields},
    gateway::Gateway,
    notify::{NotificationKind, Notifier},
    schema::ValidationErrors,
};

const SUCCESS_TITLE: &str = "Éxito";
const ERROR_TITLE: &str = "Error";
const GENERIC_REJECTION: &str = "No se pudo guardar el registro";
const GENERIC_FAULT: &str = "Ocurrió un error inesperado al guardar, intente de nuevo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode<E> {
    Create,
    Edit(E),
}

impl<E> FormMode<E> {
    pub fn save_mode(&self) -> SaveMode {
        match self {
            Self::Create => SaveMode::Create,
            Self::Edit(_) => SaveMode::Update,
        }
    }
}

pub type SubmitCallback<E> = Box<dyn Fn(&E) + Send + Sync>;
pub type CloseCallback = Box<dyn Fn() + Send + Sync>;

/// How a form is opened and who hears about it finishing.
pub struct FormConfig<E> {
    pub mode: FormMode<E>,
    pub on_submit: SubmitCallback<E>,
    pub on_close: CloseCallback,
}

impl<E> FormConfig<E> {
    pub fn new(mode: FormMode<E>) -> Self {
        Self {
            mode,
            on_submit: Box::new(|_| {}),
            on_close: Box::new(|| {}),
        }
    }

    pub fn on_submit(mut self, callback: impl Fn(&E) + Send + Sync + 'static) -> Self {
        self.on_submit = Box::new(callback);
        self
    }

    pub fn on_close(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Box::new(callback);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitPhase {
    Idle,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormStatus {
    pub phase: SubmitPhase,
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<E> {
    Saved { entity: E, id: Option<String> },
    Invalid(ValidationErrors),
    Rejected { reason: String },
    Faulted { message: String },
    /// Submit while already submitting, or on a closed form.
    Ignored,
}

impl<E> SubmitOutcome<E> {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    /// The error a caller reports for anything but `Saved`. Gateways reject a
    /// create when the key already exists and an update when it does not.
    pub fn api_error(&self, mode: SaveMode) -> Option<ApiError> {
        let (code, message) = match self {
            Self::Saved { .. } => return None,
            Self::Invalid(errors) => (ErrorCode::Validation, errors.to_string()),
            Self::Rejected { reason } => match mode {
                SaveMode::Create => (ErrorCode::Duplicate, reason.clone()),
                SaveMode::Update => (ErrorCode::NotFound, reason.clone()),
            },
            Self::Faulted { message } => (ErrorCode::Internal, message.clone()),
            Self::Ignored => (ErrorCode::Busy, "form did not accept the submission".to_string()),
        };
        Some(ApiError::new(code, message))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("form is submitting")]
    Busy,
    #[error("form is closed")]
    Closed,
    #[error("unknown field '{0}'")]
    UnknownField(String),
}

impl FormError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Busy => ErrorCode::Busy,
            Self::Closed => ErrorCode::Closed,
            Self::UnknownField(_) => ErrorCode::Validation,
        }
    }
}

impl From<FormError> for ApiError {
    fn from(value: FormError) -> Self {
        ApiError::new(value.code(), value.to_string())
    }
}

struct FormState<E> {
    mode: FormMode<E>,
    fields: FormFields,
    errors: ValidationErrors,
}

impl<E: FormEntity> FormState<E> {
    fn opened(mode: FormMode<E>) -> Self {
        let fields = match &mode {
            FormMode::Create => E::defaults(),
            FormMode::Edit(entity) => entity.to_fields(),
        };
        Self {
            mode,
            fields,
            errors: ValidationErrors::default(),
        }
    }

    fn reset(&mut self) {
        *self = Self::opened(FormMode::Create);
    }
}

/// Returns the form to `Idle` when dropped, closing it too if the save succeeded.
struct SubmittingGuard<'a> {
    status: &'a watch::Sender<FormStatus>,
    close: bool,
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        let close = self.close;
        self.status.send_modify(|status| {
            status.phase = SubmitPhase::Idle;
            if close {
                status.open = false;
            }
        });
    }
}

pub struct FormController<E: FormEntity> {
    gateway: Arc<dyn Gateway<E>>,
    notifier: Arc<dyn Notifier>,
    on_submit: SubmitCallback<E>,
    on_close: CloseCallback,
    state: Mutex<FormState<E>>,
    status: watch::Sender<FormStatus>,
}

impl<E: FormEntity> fmt::Debug for FormController<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("kind", &E::KIND)
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

impl<E: FormEntity> FormController<E> {
    /// Opens a form instance in `config.mode`.
    pub fn new(
        config: FormConfig<E>,
        gateway: Arc<dyn Gateway<E>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (status, _) = watch::channel(FormStatus {
            phase: SubmitPhase::Idle,
            open: true,
        });
        Self {
            gateway,
            notifier,
            on_submit: config.on_submit,
            on_close: config.on_close,
            state: Mutex::new(FormState::opened(config.mode)),
            status,
        }
    }

    pub fn status(&self) -> FormStatus {
        *self.status.borrow()
    }

    pub fn phase(&self) -> SubmitPhase {
        self.status().phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase() == SubmitPhase::Submitting
    }

    pub fn is_open(&self) -> bool {
        self.status().open
    }

    pub fn subscribe(&self) -> watch::Receiver<FormStatus> {
        self.status.subscribe()
    }

    pub async fn fields(&self) -> FormFields {
        self.state.lock().await.fields.clone()
    }

    pub async fn mode(&self) -> FormMode<E> {
        self.state.lock().await.mode.clone()
    }

    /// Violations recorded by the last rejected submit, minus fields edited since.
    pub async fn errors(&self) -> ValidationErrors {
        self.state.lock().await.errors.clone()
    }

    /// Validates the current mapping without touching any state.
    pub async fn check(&self) -> Result<E, ValidationErrors> {
        let state = self.state.lock().await;
        entities::validate::<E>(&state.fields)
    }

    /// (Re)opens the form, discarding whatever the mapping held.
    pub async fn open(&self, mode: FormMode<E>) -> Result<(), FormError> {
        let mut state = self.state.lock().await;
        if self.is_busy() {
            return Err(FormError::Busy);
        }
        *state = FormState::opened(mode);
        self.status.send_modify(|status| status.open = true);
        debug!(kind = E::KIND, "form opened");
        Ok(())
    }

    pub async fn close(&self) -> Result<(), FormError> {
        let mut state = self.state.lock().await;
        if self.is_busy() {
            return Err(FormError::Busy);
        }
        if !self.is_open() {
            return Ok(());
        }
        state.reset();
        self.status.send_modify(|status| status.open = false);
        drop(state);

        debug!(kind = E::KIND, "form closed");
        (self.on_close)();
        Ok(())
    }

    pub async fn set_field(
        &self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), FormError> {
        let mut state = self.state.lock().await;
        self.ensure_editable(name)?;
        state.fields.set(name, value);
        state.errors.clear_field(name);
        Ok(())
    }

    pub async fn clear_field(&self, name: &str) -> Result<(), FormError> {
        let mut state = self.state.lock().await;
        self.ensure_editable(name)?;
        state.fields.remove(name);
        state.errors.clear_field(name);
        Ok(())
    }

    /// Applies several edits at once; nothing is applied if any name is unknown.
    pub async fn merge_fields(&self, fields: FormFields) -> Result<(), FormError> {
        let mut state = self.state.lock().await;
        for (name, _) in fields.iter() {
            self.ensure_editable(name)?;
        }
        for (name, _) in fields.iter() {
            state.errors.clear_field(name);
        }
        state.fields.merge(fields);
        Ok(())
    }

    fn ensure_editable(&self, name: &str) -> Result<(), FormError> {
        let status = self.status();
        if status.phase == SubmitPhase::Submitting {
            return Err(FormError::Busy);
        }
        if !status.open {
            return Err(FormError::Closed);
        }
        if !E::schema().contains(name) {
            return Err(FormError::UnknownField(name.to_string()));
        }
        Ok(())
    }

    /// Marks the form as submitting unless it already is or is closed.
    fn begin_submit(&self) -> Option<SubmittingGuard<'_>> {
        let entered = self.status.send_if_modified(|status| {
            if status.open && status.phase == SubmitPhase::Idle {
                status.phase = SubmitPhase::Submitting;
                true
            } else {
                false
            }
        });
        entered.then_some(SubmittingGuard {
            status: &self.status,
            close: false,
        })
    }

    pub async fn submit(&self) -> SubmitOutcome<E> {
        let (entity, mode, mut guard) = {
            let mut state = self.state.lock().await;
            let status = self.status();
            if !status.open || status.phase == SubmitPhase::Submitting {
                debug!(kind = E::KIND, ?status, "submit ignored");
                return SubmitOutcome::Ignored;
            }

            let entity = match entities::validate::<E>(&state.fields) {
                Ok(entity) => entity,
                Err(errors) => {
                    debug!(kind = E::KIND, violations = errors.len(), "form rejected by validation");
                    state.errors = errors.clone();
                    return SubmitOutcome::Invalid(errors);
                }
            };
            state.errors = ValidationErrors::default();

            let Some(guard) = self.begin_submit() else {
                return SubmitOutcome::Ignored;
            };
            (entity, state.mode.save_mode(), guard)
        };

        info!(kind = E::KIND, ?mode, "submitting form");
        match self.gateway.save(entity.to_record(), mode).await {
            Ok(SaveOutcome::Saved { id }) => {
                // Last suspension point: from here the success side effects run to completion.
                let mut state = self.state.lock().await;
                info!(kind = E::KIND, ?mode, id = id.as_deref(), "form saved");
                self.notifier.notify(
                    NotificationKind::Success,
                    SUCCESS_TITLE,
                    E::success_message(mode),
                );
                (self.on_submit)(&entity);
                state.reset();
                drop(state);
                guard.close = true;
                drop(guard);
                (self.on_close)();
                SubmitOutcome::Saved { entity, id }
            }
            Ok(SaveOutcome::Rejected { reason }) => {
                let reason = reason
                    .filter(|reason| !reason.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_REJECTION.to_string());
                warn!(kind = E::KIND, ?mode, %reason, "gateway rejected form");
                self.notifier
                    .notify(NotificationKind::Error, ERROR_TITLE, &reason);
                SubmitOutcome::Rejected { reason }
            }
            Err(err) => {
                error!(kind = E::KIND, ?mode, error = %format!("{err:#}"), "gateway call failed");
                self.notifier
                    .notify(NotificationKind::Error, ERROR_TITLE, GENERIC_FAULT);
                SubmitOutcome::Faulted {
                    message: format!("{err:#}"),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
