use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use serde_json::{Map, Value};

use super::classify::{
    ClassifiedError, classify_backend_error, classify_response_entry, network_error,
};
use super::controller::{
    FormEngine, FormResult, FormState, SubmitOutcome, SubmitTicket, write_lock,
};
use super::error_log::{ErrorLogEntry, ErrorLogKind};
use super::field::{FormField, FormValues};
use super::validation::validate_values;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SubmitError {
    Backend(String),
    /// A failed HTTP response, parsed and logged by the engine itself.
    Response {
        status: u16,
        content_type: Option<String>,
        body: String,
    },
    Network(String),
    Unexpected(String),
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Backend(message) => write!(f, "backend rejected submit: {message}"),
            SubmitError::Response { status, body, .. } => {
                write!(f, "backend answered {status}: {body}")
            }
            SubmitError::Network(message) => write!(f, "submit failed to reach backend: {message}"),
            SubmitError::Unexpected(message) => write!(f, "unexpected submit failure: {message}"),
        }
    }
}

impl std::error::Error for SubmitError {}

impl SubmitError {
    pub fn response(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        SubmitError::Response {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }
}

impl From<String> for SubmitError {
    fn from(message: String) -> Self {
        SubmitError::Backend(message)
    }
}

impl From<&str> for SubmitError {
    fn from(message: &str) -> Self {
        SubmitError::Backend(message.to_string())
    }
}

pub type BoxedSubmitFuture = Pin<Box<dyn Future<Output = Result<(), SubmitError>> + Send + 'static>>;

pub trait Submitter<F: FormField>: Send + Sync + 'static {
    fn submit(&self, values: FormValues<F>) -> BoxedSubmitFuture;
}

impl<F, S, Fut> Submitter<F> for S
where
    F: FormField,
    S: Fn(FormValues<F>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SubmitError>> + Send + 'static,
{
    fn submit(&self, values: FormValues<F>) -> BoxedSubmitFuture {
        Box::pin((self)(values))
    }
}

/// Holds the in-flight flag for one submit and releases it on every exit,
/// including when the submit future is dropped before completion.
struct InFlight<'a, F: FormField> {
    state: &'a RwLock<FormState<F>>,
    ticket: SubmitTicket,
}

impl<F: FormField> Drop for InFlight<'_, F> {
    fn drop(&mut self) {
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.ticket == self.ticket {
            state.submitting = false;
        }
    }
}

impl<F: FormField> FormEngine<F> {
    pub async fn submit(&self) -> FormResult<SubmitOutcome> {
        let (in_flight, values) = {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if state.submitting {
                tracing::debug!("submit ignored, another submit is in flight");
                return Ok(SubmitOutcome::Ignored);
            }
            state.clear_errors();
            state.submitting = true;
            state.submit_count = state.submit_count.saturating_add(1);
            state.ticket = state.ticket.next();
            let in_flight = InFlight {
                state: &self.state,
                ticket: state.ticket,
            };
            (in_flight, state.values.clone())
        };

        let errors = validate_values(
            &values,
            &self.required,
            self.validator.as_ref(),
            &self.i18n,
        );
        if !errors.is_empty() {
            let mut context = Map::new();
            {
                let mut state = write_lock(&self.state, "applying submit validation result")?;
                if state.ticket != in_flight.ticket {
                    return Ok(SubmitOutcome::Superseded);
                }
                for (field, error) in errors {
                    context.insert(field.name().to_string(), Value::from(error.message.clone()));
                    state.errors.insert(field, error.message);
                }
            }
            if self.options.log_validation_failures {
                self.record_error(
                    ErrorLogEntry::new(ErrorLogKind::FormError, "Form validation failed")
                        .with_context_value("errors", Value::Object(context)),
                );
            }
            return Ok(SubmitOutcome::Invalid);
        }

        tracing::debug!(ticket = in_flight.ticket.0, "submitting form");
        let result = self.submitter.submit(values).await;

        let entry = {
            let mut state = write_lock(&self.state, "completing submit")?;
            if state.ticket != in_flight.ticket {
                tracing::debug!(ticket = in_flight.ticket.0, "dropping result of superseded submit");
                return Ok(SubmitOutcome::Superseded);
            }
            state.submitting = false;
            match result {
                Ok(()) => {
                    state.clear_errors();
                    None
                }
                Err(error) => Some(self.apply_submit_error(&mut state, error)),
            }
        };

        match entry {
            None => Ok(SubmitOutcome::Succeeded),
            Some(entry) => {
                self.record_error(entry);
                Ok(SubmitOutcome::Failed)
            }
        }
    }

    fn apply_submit_error(&self, state: &mut FormState<F>, error: SubmitError) -> ErrorLogEntry {
        match error {
            SubmitError::Backend(raw) => {
                let classified = classify_backend_error(&raw, &self.i18n);
                let entry = ErrorLogEntry::new(ErrorLogKind::ApiError, raw);
                match route_classified(state, classified) {
                    Some(field) => entry.with_context_value("field", field.name()),
                    None => entry,
                }
            }
            SubmitError::Response {
                status,
                content_type,
                body,
            } => {
                let (classified, entry) =
                    classify_response_entry(status, content_type.as_deref(), &body, &self.i18n);
                route_classified(state, classified);
                entry
            }
            SubmitError::Network(raw) => {
                state.general_error = Some(network_error(&self.i18n).message);
                ErrorLogEntry::new(ErrorLogKind::NetworkError, raw)
            }
            SubmitError::Unexpected(raw) => {
                state.general_error = Some(self.i18n.t("form.unexpected"));
                ErrorLogEntry::new(ErrorLogKind::FormError, "Unexpected error in form submission")
                    .with_context_value("error", raw)
            }
        }
    }
}

// Backend field hints the form does not declare become the general error.
fn route_classified<F: FormField>(
    state: &mut FormState<F>,
    classified: ClassifiedError,
) -> Option<F> {
    let field = classified.field.and_then(F::from_name);
    match field {
        Some(field) => {
            state.errors.insert(field, classified.message);
        }
        None => state.general_error = Some(classified.message),
    }
    field
}
