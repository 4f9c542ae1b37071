use std::fmt::{Display, Formatter};
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Local, Months, NaiveDate};
use regex::Regex;

use super::field::{FieldValue, FormField, FormValues};
use crate::i18n::I18nManager;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));
static PESEL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{11}$").expect("PESEL pattern is valid"));

const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 40;
const PASSWORD_SYMBOLS: &str = "@$!%*?&";
const NAME_MIN_LEN: usize = 2;
const MAX_AGE_YEARS: u32 = 120;
const GENDERS: [&str; 2] = ["MALE", "FEMALE"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FieldErrorKind {
    Missing,
    Format,
    Length,
    Range,
    Choice,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

pub trait FieldValidator: Send + Sync {
    fn validate(&self, field: &str, value: &FieldValue) -> Option<FieldError>;
}

impl<F> FieldValidator for F
where
    F: Fn(&str, &FieldValue) -> Option<FieldError> + Send + Sync,
{
    fn validate(&self, field: &str, value: &FieldValue) -> Option<FieldError> {
        (self)(field, value)
    }
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Clone)]
pub struct StandardFieldValidator {
    i18n: I18nManager,
    clock: Arc<dyn Clock>,
}

impl Default for StandardFieldValidator {
    fn default() -> Self {
        Self::new(I18nManager::new())
    }
}

impl StandardFieldValidator {
    pub fn new(i18n: I18nManager) -> Self {
        Self {
            i18n,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn error(&self, field: &str, kind: FieldErrorKind, key: &str) -> Option<FieldError> {
        Some(FieldError::new(field, kind, self.i18n.t(key)))
    }

    fn validate_email(&self, field: &str, value: &FieldValue) -> Option<FieldError> {
        let text = match value.as_text() {
            Some(text) if !text.is_empty() => text,
            _ => {
                return self.error(field, FieldErrorKind::Missing, "validation.email.required");
            }
        };
        if !EMAIL_PATTERN.is_match(text) {
            return self.error(field, FieldErrorKind::Format, "validation.email.format");
        }
        None
    }

    fn validate_password(&self, field: &str, value: &FieldValue) -> Option<FieldError> {
        let text = match value.as_text() {
            Some(text) if !text.is_empty() => text,
            _ => {
                return self.error(field, FieldErrorKind::Missing, "validation.password.required");
            }
        };
        let length = text.chars().count();
        if length < PASSWORD_MIN_LEN {
            return self.error(field, FieldErrorKind::Length, "validation.password.too_short");
        }
        if length > PASSWORD_MAX_LEN || !is_strong_password(text) {
            return self.error(field, FieldErrorKind::Format, "validation.password.format");
        }
        None
    }

    fn validate_pesel(&self, field: &str, value: &FieldValue) -> Option<FieldError> {
        let text = match value.as_text() {
            Some(text) if !text.is_empty() => text,
            _ => {
                return self.error(field, FieldErrorKind::Missing, "validation.pesel.required");
            }
        };
        if !PESEL_PATTERN.is_match(text) {
            return self.error(field, FieldErrorKind::Format, "validation.pesel.format");
        }
        None
    }

    fn validate_person_name(&self, field: &str, value: &FieldValue) -> Option<FieldError> {
        let label_key = if field == "firstName" {
            "validation.name.first_name"
        } else {
            "validation.name.last_name"
        };
        let label = self.i18n.t(label_key);
        let trimmed = value.as_text().map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            let message = self
                .i18n
                .t_with("validation.name.required", &[("label", &label)]);
            return Some(FieldError::new(field, FieldErrorKind::Missing, message));
        }
        if trimmed.chars().count() < NAME_MIN_LEN {
            let message = self
                .i18n
                .t_with("validation.name.too_short", &[("label", &label)]);
            return Some(FieldError::new(field, FieldErrorKind::Length, message));
        }
        None
    }

    fn validate_birth_date(&self, field: &str, value: &FieldValue) -> Option<FieldError> {
        let text = match value.as_text() {
            Some(text) if !text.trim().is_empty() => text.trim(),
            _ => {
                return self.error(
                    field,
                    FieldErrorKind::Missing,
                    "validation.birth_date.required",
                );
            }
        };
        let Some(birth_date) = parse_date(text) else {
            return self.error(field, FieldErrorKind::Format, "validation.birth_date.invalid");
        };

        let today = self.clock.today();
        if birth_date > today {
            return self.error(field, FieldErrorKind::Range, "validation.birth_date.future");
        }
        let oldest = today
            .checked_sub_months(Months::new(MAX_AGE_YEARS * 12))
            .unwrap_or(NaiveDate::MIN);
        if birth_date < oldest {
            return self.error(field, FieldErrorKind::Range, "validation.birth_date.invalid");
        }
        None
    }

    fn validate_gender(&self, field: &str, value: &FieldValue) -> Option<FieldError> {
        match value.as_text() {
            Some(text) if GENDERS.contains(&text) => None,
            _ => self.error(field, FieldErrorKind::Choice, "validation.gender.required"),
        }
    }
}

impl FieldValidator for StandardFieldValidator {
    fn validate(&self, field: &str, value: &FieldValue) -> Option<FieldError> {
        match field {
            "email" => self.validate_email(field, value),
            "password" => self.validate_password(field, value),
            "PESEL" => self.validate_pesel(field, value),
            "firstName" | "lastName" => self.validate_person_name(field, value),
            "birthDate" => self.validate_birth_date(field, value),
            "gender" => self.validate_gender(field, value),
            _ => None,
        }
    }
}

fn is_strong_password(text: &str) -> bool {
    let allowed = text
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(ch));
    allowed
        && text.chars().any(|ch| ch.is_ascii_uppercase())
        && text.chars().any(|ch| ch.is_ascii_lowercase())
        && text.chars().any(|ch| ch.is_ascii_digit())
        && text.chars().any(|ch| PASSWORD_SYMBOLS.contains(ch))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|stamp| stamp.date_naive())
        })
}

pub fn validate_values<F: FormField>(
    values: &FormValues<F>,
    required: &[F],
    validator: &dyn FieldValidator,
    i18n: &I18nManager,
) -> Vec<(F, FieldError)> {
    let mut errors = Vec::new();
    for field in required {
        let value = values.get(*field);
        if value.is_blank() {
            errors.push((
                *field,
                FieldError::new(field.name(), FieldErrorKind::Missing, i18n.t("form.required")),
            ));
            continue;
        }
        if let Some(error) = validator.validate(field.name(), value) {
            errors.push((*field, error));
        }
    }
    errors
}
