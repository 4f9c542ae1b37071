pub use crate::form::{
    ClassifiedError, ErrorLog, ErrorLogEntry, ErrorLogKind, ErrorOrigin, ErrorTarget, FieldError,
    FieldErrorKind, FieldValidator, FieldValue, FileRef, FormEngine, FormError, FormField,
    FormOptions, FormResult, FormSnapshot, FormValues, RingBufferErrorLog, StandardFieldValidator,
    SubmitError, SubmitOutcome, Submitter, classify_backend_error, classify_response,
};
pub use crate::forms::{
    CitizenEditField, CitizenRecord, DocumentRequestField, DocumentRequestValidator, LoginField,
    OfficialField, OfficialRecord, PersonalDataRequestField, RegisterField,
};
pub use crate::i18n::{I18nManager, Locale};
