use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error_log::{ErrorLog, ErrorLogEntry, RingBufferErrorLog};
use super::field::{FieldValue, FormField, FormValues};
use super::submit::Submitter;
use super::validation::{FieldValidator, StandardFieldValidator};
use crate::i18n::I18nManager;

/// Generation of the submit lifecycle. Reset and reinitialize advance it, so
/// a submit that started under an older ticket cannot write its result back.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct SubmitTicket(pub u64);

impl SubmitTicket {
    pub(super) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    Ignored,
    Invalid,
    Succeeded,
    Failed,
    Superseded,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorTarget<F> {
    General,
    Field(F),
}

impl<F: FormField> From<F> for ErrorTarget<F> {
    fn from(field: F) -> Self {
        ErrorTarget::Field(field)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormOptions {
    pub validate_on_change: bool,
    pub log_validation_failures: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_on_change: true,
            log_validation_failures: true,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormSnapshot<F: FormField> {
    pub values: FormValues<F>,
    pub errors: BTreeMap<F, String>,
    pub general_error: Option<String>,
    pub is_submitting: bool,
    pub has_errors: bool,
    pub is_valid: bool,
    pub submit_count: u32,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
    UnknownField(String),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::UnknownField(name) => write!(f, "form has no field named `{name}`"),
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

pub(super) struct FormState<F: FormField> {
    pub(super) initial: FormValues<F>,
    pub(super) values: FormValues<F>,
    pub(super) errors: BTreeMap<F, String>,
    pub(super) general_error: Option<String>,
    pub(super) submitting: bool,
    pub(super) ticket: SubmitTicket,
    pub(super) submit_count: u32,
}

impl<F: FormField> FormState<F> {
    pub(super) fn clear_errors(&mut self) {
        self.errors.clear();
        self.general_error = None;
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.general_error.is_some()
    }

    fn is_valid(&self, required: &[F]) -> bool {
        !self.has_errors() && required.iter().all(|field| !self.values.is_blank(*field))
    }
}

/// Clones are handles to the same form. No lock is held while the submitter runs.
#[derive(Clone)]
pub struct FormEngine<F: FormField> {
    pub(super) options: FormOptions,
    pub(super) required: Arc<[F]>,
    pub(super) submitter: Arc<dyn Submitter<F>>,
    pub(super) validator: Arc<dyn FieldValidator>,
    pub(super) error_log: Arc<dyn ErrorLog>,
    pub(super) i18n: I18nManager,
    pub(super) state: Arc<RwLock<FormState<F>>>,
    custom_validator: bool,
}

impl<F: FormField> FormEngine<F> {
    pub fn new(
        initial: FormValues<F>,
        required: impl IntoIterator<Item = F>,
        submitter: impl Submitter<F>,
        options: FormOptions,
    ) -> Self {
        let mut ordered = Vec::new();
        for field in required {
            if !ordered.contains(&field) {
                ordered.push(field);
            }
        }
        let i18n = I18nManager::new();

        Self {
            options,
            required: ordered.into(),
            submitter: Arc::new(submitter),
            validator: Arc::new(StandardFieldValidator::new(i18n.clone())),
            error_log: Arc::new(RingBufferErrorLog::default()),
            i18n,
            state: Arc::new(RwLock::new(FormState {
                values: initial.clone(),
                initial,
                errors: BTreeMap::new(),
                general_error: None,
                submitting: false,
                ticket: SubmitTicket::default(),
                submit_count: 0,
            })),
            custom_validator: false,
        }
    }

    pub fn with_validator(mut self, validator: impl FieldValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self.custom_validator = true;
        self
    }

    pub fn with_error_log(mut self, error_log: impl ErrorLog) -> Self {
        self.error_log = Arc::new(error_log);
        self
    }

    pub fn with_shared_error_log(mut self, error_log: Arc<dyn ErrorLog>) -> Self {
        self.error_log = error_log;
        self
    }

    pub fn with_i18n(mut self, i18n: I18nManager) -> Self {
        if !self.custom_validator {
            self.validator = Arc::new(StandardFieldValidator::new(i18n.clone()));
        }
        self.i18n = i18n;
        self
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn i18n(&self) -> &I18nManager {
        &self.i18n
    }

    pub fn required_fields(&self) -> &[F] {
        &self.required
    }

    pub fn is_required(&self, field: F) -> bool {
        self.required.contains(&field)
    }

    pub fn handle_change(&self, field: F, value: impl Into<FieldValue>) -> FormResult<()> {
        let value = value.into();
        let error = if self.options.validate_on_change {
            self.validator.validate(field.name(), &value)
        } else {
            None
        };

        let mut state = write_lock(&self.state, "applying field change")?;
        state.values.set(field, value);
        state.errors.remove(&field);
        if let Some(error) = error {
            tracing::trace!(field = field.name(), message = %error.message, "field rejected");
            state.errors.insert(field, error.message);
        }
        Ok(())
    }

    pub fn set_error(
        &self,
        target: impl Into<ErrorTarget<F>>,
        message: impl Into<String>,
    ) -> FormResult<()> {
        let mut state = write_lock(&self.state, "setting form error")?;
        match target.into() {
            ErrorTarget::General => state.general_error = Some(message.into()),
            ErrorTarget::Field(field) => {
                state.errors.insert(field, message.into());
            }
        }
        Ok(())
    }

    pub fn set_field_error(&self, field: F, message: impl Into<String>) -> FormResult<()> {
        self.set_error(ErrorTarget::Field(field), message)
    }

    pub fn set_error_named(&self, name: &str, message: impl Into<String>) -> FormResult<()> {
        let target = if name == "general" {
            ErrorTarget::General
        } else {
            let field = F::from_name(name).ok_or_else(|| FormError::UnknownField(name.to_string()))?;
            ErrorTarget::Field(field)
        };
        self.set_error(target, message)
    }

    pub fn clear_errors(&self) -> FormResult<()> {
        write_lock(&self.state, "clearing form errors")?.clear_errors();
        Ok(())
    }

    pub fn reset_form(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        reset_state(&mut state);
        Ok(())
    }

    pub fn reinitialize(&self, initial: FormValues<F>) -> FormResult<()> {
        let mut state = write_lock(&self.state, "reinitializing form")?;
        state.initial = initial;
        reset_state(&mut state);
        Ok(())
    }

    pub fn values(&self) -> FormResult<FormValues<F>> {
        Ok(read_lock(&self.state, "reading form values")?.values.clone())
    }

    pub fn initial_values(&self) -> FormResult<FormValues<F>> {
        Ok(read_lock(&self.state, "reading initial values")?.initial.clone())
    }

    pub fn value(&self, field: F) -> FormResult<FieldValue> {
        Ok(read_lock(&self.state, "reading field value")?
            .values
            .get(field)
            .clone())
    }

    pub fn errors(&self) -> FormResult<BTreeMap<F, String>> {
        Ok(read_lock(&self.state, "reading field errors")?.errors.clone())
    }

    pub fn field_error(&self, field: F) -> FormResult<Option<String>> {
        Ok(read_lock(&self.state, "reading field error")?
            .errors
            .get(&field)
            .cloned())
    }

    pub fn general_error(&self) -> FormResult<Option<String>> {
        Ok(read_lock(&self.state, "reading general error")?
            .general_error
            .clone())
    }

    pub fn is_submitting(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading submit state")?.submitting)
    }

    pub fn has_errors(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading error state")?.has_errors())
    }

    pub fn is_valid(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "computing form validity")?.is_valid(&self.required))
    }

    pub fn submit_count(&self) -> FormResult<u32> {
        Ok(read_lock(&self.state, "reading submit count")?.submit_count)
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<F>> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            values: state.values.clone(),
            errors: state.errors.clone(),
            general_error: state.general_error.clone(),
            is_submitting: state.submitting,
            has_errors: state.has_errors(),
            is_valid: state.is_valid(&self.required),
            submit_count: state.submit_count,
        })
    }

    pub(super) fn record_error(&self, entry: ErrorLogEntry) {
        entry.trace();
        self.error_log.record(entry);
    }
}

fn reset_state<F: FormField>(state: &mut FormState<F>) {
    state.values = state.initial.clone();
    state.clear_errors();
    state.submitting = false;
    state.ticket = state.ticket.next();
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
