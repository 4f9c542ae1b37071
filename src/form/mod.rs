mod classify;
mod controller;
mod error_log;
mod field;
mod submit;
mod validation;


pub use classify::{
    ClassifiedError, ErrorOrigin, backend_message_from_response, classify_backend_error,
    classify_response, network_error,
};
pub use controller::{
    ErrorTarget, FormEngine, FormError, FormOptions, FormResult, FormSnapshot, SubmitOutcome,
    SubmitTicket,
};
pub use error_log::{
    DEFAULT_ERROR_LOG_CAPACITY, ErrorLog, ErrorLogEntry, ErrorLogKind, NoopErrorLog,
    RingBufferErrorLog,
};
pub use field::{FieldValue, FileRef, FormField, FormValues};
pub use mobywatel_form_derive::FormField;
pub use submit::{BoxedSubmitFuture, SubmitError, Submitter};
pub use validation::{
    Clock, FieldError, FieldErrorKind, FieldValidator, FixedClock, StandardFieldValidator,
    SystemClock, validate_values,
};
