use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use super::error_log::{ErrorLog, ErrorLogEntry, ErrorLogKind};
use crate::i18n::I18nManager;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorOrigin {
    Validation,
    Network,
    Server,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassifiedError {
    pub field: Option<&'static str>,
    pub message: String,
    pub origin: ErrorOrigin,
}

struct BackendErrorRule {
    pattern: Regex,
    field: Option<&'static str>,
    message_key: &'static str,
}

// Specific phrases first; the generic ones at the end would swallow them.
const RULES: &[(&str, Option<&str>, &str)] = &[
    (r"(incorrect|invalid) email", Some("email"), "backend.incorrect_email"),
    (
        r"(incorrect|invalid) password",
        Some("password"),
        "backend.incorrect_password",
    ),
    (r"email is taken", Some("email"), "backend.email_taken"),
    (r"pesel is taken", Some("PESEL"), "backend.pesel_taken"),
    (
        r"invalid pesel|pesel must be 11",
        Some("PESEL"),
        "backend.invalid_pesel",
    ),
    (
        r"the birth date and gender must match.*pesel",
        Some("PESEL"),
        "backend.pesel_mismatch",
    ),
    (
        r"citizen id is required",
        Some("citizenID"),
        "backend.citizen_id_required",
    ),
    (r"field is null", None, "backend.field_null"),
    (r"field is blank", None, "backend.field_blank"),
    (
        r"birth date is after current date",
        Some("birthDate"),
        "backend.birth_date_future",
    ),
    (r"bad credentials", None, "backend.bad_credentials"),
    (r"email not found", Some("email"), "backend.email_not_found"),
    (r"user not found", None, "backend.user_not_found"),
    (r"jwt.*expired", None, "backend.session_expired"),
    (r"unauthorized", None, "backend.unauthorized"),
    (r"conflict", None, "backend.conflict"),
];

static BACKEND_ERROR_RULES: LazyLock<Vec<BackendErrorRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|(pattern, field, message_key)| BackendErrorRule {
            pattern: RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("backend error pattern is valid"),
            field: *field,
            message_key: *message_key,
        })
        .collect()
});

pub fn classify_backend_error(raw: &str, i18n: &I18nManager) -> ClassifiedError {
    for rule in BACKEND_ERROR_RULES.iter() {
        if rule.pattern.is_match(raw) {
            return ClassifiedError {
                field: rule.field,
                message: i18n.t(rule.message_key),
                origin: ErrorOrigin::Server,
            };
        }
    }

    ClassifiedError {
        field: None,
        message: i18n.t("backend.unexpected"),
        origin: ErrorOrigin::Server,
    }
}

pub fn network_error(i18n: &I18nManager) -> ClassifiedError {
    ClassifiedError {
        field: None,
        message: i18n.t("backend.network"),
        origin: ErrorOrigin::Network,
    }
}

pub fn backend_message_from_response(
    content_type: Option<&str>,
    body: &str,
    i18n: &I18nManager,
) -> String {
    let is_json = content_type.is_some_and(|value| value.contains("application/json"));
    let extracted = if is_json {
        serde_json::from_str::<Value>(body).ok().and_then(|json| {
            ["message", "error"].iter().find_map(|key| {
                json.get(key)
                    .and_then(Value::as_str)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            })
        })
    } else {
        Some(body.trim().to_string()).filter(|text| !text.is_empty())
    };
    extracted.unwrap_or_else(|| i18n.t("backend.server"))
}

pub fn classify_response(
    status: u16,
    content_type: Option<&str>,
    body: &str,
    i18n: &I18nManager,
    log: &dyn ErrorLog,
) -> ClassifiedError {
    let (classified, entry) = classify_response_entry(status, content_type, body, i18n);
    entry.trace();
    log.record(entry);
    classified
}

pub(super) fn classify_response_entry(
    status: u16,
    content_type: Option<&str>,
    body: &str,
    i18n: &I18nManager,
) -> (ClassifiedError, ErrorLogEntry) {
    let message = backend_message_from_response(content_type, body, i18n);
    let mut context = Map::new();
    context.insert("status".to_string(), Value::from(status));
    let classified = classify_backend_error(&message, i18n);
    if let Some(field) = classified.field {
        context.insert("field".to_string(), Value::from(field));
    }
    let entry = ErrorLogEntry::new(ErrorLogKind::ApiError, message).with_context(context);
    (classified, entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::RingBufferErrorLog;

    fn pl() -> I18nManager {
        I18nManager::with_locale("pl")
    }

    #[test]
    fn rules_compile() {
        assert_eq!(BACKEND_ERROR_RULES.len(), RULES.len());
    }

    #[test]
    fn duplicate_email_routes_to_email_field() {
        let classified = classify_backend_error("Bad request: Email is taken", &pl());
        assert_eq!(classified.field, Some("email"));
        assert_eq!(classified.message, "Ten adres email jest już zajęty");
        assert_eq!(classified.origin, ErrorOrigin::Server);
    }

    #[test]
    fn backend_diagnostics_map_in_order() {
        let cases = [
            ("Bad request: Invalid email", Some("email"), "Niepoprawny format adresu email"),
            (
                "Bad request: Incorrect password",
                Some("password"),
                "Hasło nie spełnia wymagań bezpieczeństwa",
            ),
            (
                "Bad request: PESEL is taken.",
                Some("PESEL"),
                "Ten numer PESEL jest już zarejestrowany",
            ),
            ("Bad request: Invalid pesel.", Some("PESEL"), "Niepoprawny numer PESEL"),
            ("Pesel must be 11 characters.", Some("PESEL"), "Niepoprawny numer PESEL"),
            (
                "Bad request: The birth date and gender must match the PESEL.",
                Some("PESEL"),
                "Data urodzenia i płeć muszą odpowiadać numerowi PESEL",
            ),
            (
                "Bad request: Citizen ID is required",
                Some("citizenID"),
                "ID obywatela jest wymagane",
            ),
            ("Bad request: A field is null.", None, "Wszystkie pola są wymagane"),
            (
                "Bad request: A field is blank.",
                None,
                "Wszystkie pola muszą być wypełnione",
            ),
            (
                "Bad request: Birth date is after current date.",
                Some("birthDate"),
                "Data urodzenia nie może być z przyszłości",
            ),
            ("Bad credentials", None, "Niepoprawny email lub hasło"),
            (
                "Email not found",
                Some("email"),
                "Nie znaleziono konta z tym adresem email",
            ),
            ("User not found", None, "Nie znaleziono użytkownika"),
            (
                "JWT token has expired",
                None,
                "Sesja wygasła. Zaloguj się ponownie.",
            ),
            (
                "401 UNAUTHORIZED",
                None,
                "Brak uprawnień do wykonania tej operacji",
            ),
            (
                "409 Conflict",
                None,
                "Wystąpił konflikt danych. Spróbuj ponownie.",
            ),
        ];
        let i18n = pl();
        for (raw, field, message) in cases {
            let classified = classify_backend_error(raw, &i18n);
            assert_eq!(classified.field, field, "{raw}");
            assert_eq!(classified.message, message, "{raw}");
        }
    }

    #[test]
    fn specific_rule_beats_generic_one() {
        let classified = classify_backend_error("Conflict: email is taken", &pl());
        assert_eq!(classified.field, Some("email"));
        assert_eq!(classified.message, "Ten adres email jest już zajęty");
    }

    #[test]
    fn unknown_diagnostic_falls_back() {
        let classified = classify_backend_error("Some unknown error message", &pl());
        assert_eq!(classified.field, None);
        assert_eq!(
            classified.message,
            "Wystąpił nieoczekiwany błąd. Spróbuj ponownie."
        );
    }

    #[test]
    fn response_body_message_extraction() {
        let i18n = pl();
        assert_eq!(
            backend_message_from_response(
                Some("application/json; charset=utf-8"),
                r#"{"message":"Email is taken","error":"Bad Request"}"#,
                &i18n
            ),
            "Email is taken"
        );
        assert_eq!(
            backend_message_from_response(
                Some("application/json"),
                r#"{"error":"Unauthorized"}"#,
                &i18n
            ),
            "Unauthorized"
        );
        assert_eq!(
            backend_message_from_response(Some("application/json"), "{not json", &i18n),
            "Wystąpił błąd serwera"
        );
        assert_eq!(
            backend_message_from_response(Some("text/plain"), " Bad credentials \n", &i18n),
            "Bad credentials"
        );
        assert_eq!(
            backend_message_from_response(None, "", &i18n),
            "Wystąpił błąd serwera"
        );
    }

    #[test]
    fn classify_response_records_api_error() {
        let log = RingBufferErrorLog::new(10);
        let classified = classify_response(
            400,
            Some("application/json"),
            r#"{"message":"Bad request: PESEL is taken."}"#,
            &pl(),
            &log,
        );
        assert_eq!(classified.field, Some("PESEL"));

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ErrorLogKind::ApiError);
        assert_eq!(entries[0].message, "Bad request: PESEL is taken.");
        assert_eq!(entries[0].context.get("status"), Some(&Value::from(400)));
    }

    #[test]
    fn network_failures_have_their_own_message() {
        let classified = network_error(&pl());
        assert_eq!(classified.origin, ErrorOrigin::Network);
        assert_eq!(
            classified.message,
            "Błąd połączenia z serwerem. Sprawdź połączenie internetowe."
        );
    }
}
