use serde::{Deserialize, Serialize};

use crate::form::{
    FieldError, FieldErrorKind, FieldValidator, FieldValue, FileRef, FormEngine, FormField,
    FormOptions, FormValues, StandardFieldValidator, Submitter,
};
use crate::i18n::I18nManager;

pub const DEFAULT_GENDER: &str = "MALE";
pub const DEFAULT_CITIZENSHIP: &str = "POLSKA";
pub const IDENTITY_CARD: &str = "IDENTITY_CARD";
pub const DRIVER_LICENSE: &str = "DRIVER_LICENSE";
pub const DOCUMENT_KINDS: [&str; 2] = [IDENTITY_CARD, DRIVER_LICENSE];
pub const LICENSE_CATEGORIES: [&str; 16] = [
    "AM", "A1", "A2", "A", "B", "B1", "BE", "C1", "C", "C1E", "CE", "D1", "D", "D1E", "DE", "T",
];
pub const ACCEPTED_PHOTO_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];
pub const MAX_PHOTO_SIZE: u64 = 5 * 1024 * 1024;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenRecord {
    #[serde(rename = "citizenID")]
    pub citizen_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    #[serde(rename = "PESEL")]
    pub pesel: String,
    pub gender: String,
    pub email: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficialRecord {
    #[serde(rename = "officialID")]
    pub official_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub email: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, FormField)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, FormField)]
pub enum RegisterField {
    Email,
    Password,
    FirstName,
    LastName,
    BirthDate,
    #[field(rename = "PESEL")]
    Pesel,
    Gender,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, FormField)]
pub enum PersonalDataRequestField {
    RequestedFirstName,
    RequestedLastName,
    RequestedGender,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, FormField)]
pub enum OfficialField {
    #[field(rename = "officialID")]
    OfficialId,
    FirstName,
    LastName,
    Position,
    Email,
    Password,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, FormField)]
pub enum CitizenEditField {
    #[field(rename = "citizenID")]
    CitizenId,
    FirstName,
    LastName,
    BirthDate,
    #[field(rename = "PESEL")]
    Pesel,
    Gender,
    Email,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, FormField)]
pub enum DocumentRequestField {
    RequestedDocument,
    Photo,
    Citizenship,
    LicenseCategory,
}

pub fn login_form(submitter: impl Submitter<LoginField>) -> FormEngine<LoginField> {
    FormEngine::new(
        FormValues::blank(),
        [LoginField::Email, LoginField::Password],
        submitter,
        FormOptions::default(),
    )
}

pub fn register_form(submitter: impl Submitter<RegisterField>) -> FormEngine<RegisterField> {
    FormEngine::new(
        FormValues::blank(),
        RegisterField::ALL.iter().copied(),
        submitter,
        FormOptions::default(),
    )
}

pub fn personal_data_request_values(
    current: Option<&CitizenRecord>,
) -> FormValues<PersonalDataRequestField> {
    let gender = current
        .map(|citizen| citizen.gender.as_str())
        .filter(|gender| !gender.is_empty())
        .unwrap_or(DEFAULT_GENDER);
    FormValues::new()
        .with(
            PersonalDataRequestField::RequestedFirstName,
            current.map(|citizen| citizen.first_name.clone()).unwrap_or_default(),
        )
        .with(
            PersonalDataRequestField::RequestedLastName,
            current.map(|citizen| citizen.last_name.clone()).unwrap_or_default(),
        )
        .with(PersonalDataRequestField::RequestedGender, gender)
}

pub fn personal_data_request_form(
    current: Option<&CitizenRecord>,
    submitter: impl Submitter<PersonalDataRequestField>,
) -> FormEngine<PersonalDataRequestField> {
    FormEngine::new(
        personal_data_request_values(current),
        PersonalDataRequestField::ALL.iter().copied(),
        submitter,
        FormOptions::default(),
    )
}

pub fn create_official_form(submitter: impl Submitter<OfficialField>) -> FormEngine<OfficialField> {
    FormEngine::new(
        FormValues::new()
            .with(OfficialField::FirstName, "")
            .with(OfficialField::LastName, "")
            .with(OfficialField::Position, "")
            .with(OfficialField::Email, "")
            .with(OfficialField::Password, ""),
        [
            OfficialField::FirstName,
            OfficialField::LastName,
            OfficialField::Position,
            OfficialField::Email,
            OfficialField::Password,
        ],
        submitter,
        FormOptions::default(),
    )
}

pub fn edit_official_values(official: Option<&OfficialRecord>) -> FormValues<OfficialField> {
    let official = official.cloned().unwrap_or_default();
    FormValues::new()
        .with(OfficialField::OfficialId, official.official_id)
        .with(OfficialField::FirstName, official.first_name)
        .with(OfficialField::LastName, official.last_name)
        .with(OfficialField::Position, official.position)
        .with(OfficialField::Email, official.email)
        .with(OfficialField::Password, "")
}

pub fn edit_official_form(
    official: Option<&OfficialRecord>,
    submitter: impl Submitter<OfficialField>,
) -> FormEngine<OfficialField> {
    FormEngine::new(
        edit_official_values(official),
        [
            OfficialField::FirstName,
            OfficialField::LastName,
            OfficialField::Position,
            OfficialField::Email,
        ],
        submitter,
        FormOptions::default(),
    )
}

pub fn strip_blank_password(mut values: FormValues<OfficialField>) -> FormValues<OfficialField> {
    if values.is_blank(OfficialField::Password) {
        values.remove(OfficialField::Password);
    }
    values
}

pub fn citizen_edit_values(citizen: Option<&CitizenRecord>) -> FormValues<CitizenEditField> {
    let citizen = citizen.cloned().unwrap_or_default();
    let gender = if citizen.gender.is_empty() {
        DEFAULT_GENDER.to_string()
    } else {
        citizen.gender
    };
    FormValues::new()
        .with(CitizenEditField::CitizenId, citizen.citizen_id)
        .with(CitizenEditField::FirstName, citizen.first_name)
        .with(CitizenEditField::LastName, citizen.last_name)
        .with(CitizenEditField::BirthDate, citizen.birth_date)
        .with(CitizenEditField::Pesel, citizen.pesel)
        .with(CitizenEditField::Gender, gender)
        .with(CitizenEditField::Email, citizen.email)
}

pub fn citizen_edit_form(
    citizen: Option<&CitizenRecord>,
    submitter: impl Submitter<CitizenEditField>,
) -> FormEngine<CitizenEditField> {
    FormEngine::new(
        citizen_edit_values(citizen),
        [
            CitizenEditField::FirstName,
            CitizenEditField::LastName,
            CitizenEditField::BirthDate,
            CitizenEditField::Pesel,
            CitizenEditField::Gender,
            CitizenEditField::Email,
        ],
        submitter,
        FormOptions::default(),
    )
}

pub fn document_request_values() -> FormValues<DocumentRequestField> {
    FormValues::new()
        .with(DocumentRequestField::RequestedDocument, IDENTITY_CARD)
        .with(DocumentRequestField::Photo, None::<FileRef>)
        .with(DocumentRequestField::Citizenship, DEFAULT_CITIZENSHIP)
        .with(DocumentRequestField::LicenseCategory, Vec::<String>::new())
}

pub fn document_request_form(
    submitter: impl Submitter<DocumentRequestField>,
) -> FormEngine<DocumentRequestField> {
    let i18n = I18nManager::new();
    document_request_form_with(i18n, submitter)
}

pub fn document_request_form_with(
    i18n: I18nManager,
    submitter: impl Submitter<DocumentRequestField>,
) -> FormEngine<DocumentRequestField> {
    FormEngine::new(
        document_request_values(),
        [
            DocumentRequestField::RequestedDocument,
            DocumentRequestField::Photo,
        ],
        submitter,
        FormOptions::default(),
    )
    .with_i18n(i18n.clone())
    .with_validator(DocumentRequestValidator::new(i18n))
}

#[derive(Clone)]
pub struct DocumentRequestValidator {
    i18n: I18nManager,
    standard: StandardFieldValidator,
}

impl DocumentRequestValidator {
    pub fn new(i18n: I18nManager) -> Self {
        Self {
            standard: StandardFieldValidator::new(i18n.clone()),
            i18n,
        }
    }

    fn error(&self, field: &str, kind: FieldErrorKind, key: &str) -> Option<FieldError> {
        Some(FieldError::new(field, kind, self.i18n.t(key)))
    }
}

impl FieldValidator for DocumentRequestValidator {
    fn validate(&self, field: &str, value: &FieldValue) -> Option<FieldError> {
        match (field, value) {
            ("photo", FieldValue::File(None)) => {
                self.error(field, FieldErrorKind::Missing, "validation.photo.required")
            }
            ("photo", FieldValue::File(Some(file))) => {
                if !ACCEPTED_PHOTO_TYPES.contains(&file.mime_type.as_str()) {
                    self.error(field, FieldErrorKind::Format, "validation.photo.format")
                } else if file.size > MAX_PHOTO_SIZE {
                    self.error(field, FieldErrorKind::Length, "validation.photo.too_large")
                } else {
                    None
                }
            }
            ("photo", _) => self.error(field, FieldErrorKind::Format, "validation.photo.format"),
            ("requestedDocument", value) => match value.as_text() {
                Some(kind) if DOCUMENT_KINDS.contains(&kind) => None,
                _ => self.error(field, FieldErrorKind::Choice, "validation.document.kind"),
            },
            ("licenseCategory", FieldValue::List(categories)) => {
                let unknown = categories
                    .iter()
                    .any(|category| !LICENSE_CATEGORIES.contains(&category.as_str()));
                if unknown {
                    self.error(field, FieldErrorKind::Choice, "validation.document.category")
                } else {
                    None
                }
            }
            _ => self.standard.validate(field, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{SubmitError, SubmitOutcome};
    use futures::executor::block_on;

    async fn accept<F: FormField>(_values: FormValues<F>) -> Result<(), SubmitError> {
        Ok(())
    }

    fn citizen() -> CitizenRecord {
        CitizenRecord {
            citizen_id: 7,
            first_name: "Jan".to_string(),
            last_name: "Kowalski".to_string(),
            birth_date: "1944-05-14".to_string(),
            pesel: "44051401359".to_string(),
            gender: "MALE".to_string(),
            email: "jan@example.com".to_string(),
        }
    }

    #[test]
    fn register_form_requires_every_field_in_declaration_order() {
        let form = register_form(accept::<RegisterField>).with_i18n(I18nManager::with_locale("pl"));
        assert_eq!(form.required_fields(), RegisterField::ALL);
        assert_eq!(RegisterField::Pesel.name(), "PESEL");
        assert_eq!(RegisterField::BirthDate.name(), "birthDate");

        let outcome = block_on(form.submit()).expect("submit");
        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert_eq!(form.errors().expect("errors").len(), RegisterField::ALL.len());
    }

    #[test]
    fn citizen_records_deserialize_from_backend_json() {
        let json = r#"{"citizenID":7,"firstName":"Jan","lastName":"Kowalski","birthDate":"1944-05-14","PESEL":"44051401359","gender":"MALE","email":"jan@example.com"}"#;
        let parsed: CitizenRecord = serde_json::from_str(json).expect("citizen json");
        assert_eq!(parsed, citizen());
    }

    #[test]
    fn personal_data_request_defaults_to_male() {
        let values = personal_data_request_values(None);
        assert_eq!(values.text(PersonalDataRequestField::RequestedGender), Some("MALE"));
        assert_eq!(values.text(PersonalDataRequestField::RequestedFirstName), Some(""));

        let values = personal_data_request_values(Some(&citizen()));
        assert_eq!(
            values.text(PersonalDataRequestField::RequestedLastName),
            Some("Kowalski")
        );
    }

    #[test]
    fn citizen_edit_form_follows_the_selected_citizen() {
        let form = citizen_edit_form(None, accept::<CitizenEditField>);
        assert!(!form.is_valid().expect("validity"));

        form.reinitialize(citizen_edit_values(Some(&citizen())))
            .expect("reinitialize");
        assert_eq!(
            form.value(CitizenEditField::CitizenId).expect("value"),
            FieldValue::Number(7)
        );
        assert_eq!(
            form.values().expect("values").to_json()["citizenID"],
            serde_json::json!(7)
        );
        assert!(form.is_valid().expect("validity"));
    }

    #[test]
    fn edit_official_password_is_optional() {
        let official = OfficialRecord {
            official_id: 3,
            first_name: "Anna".to_string(),
            last_name: "Nowak".to_string(),
            position: "Urzędnik".to_string(),
            email: "anna@gov.pl".to_string(),
        };
        let form = edit_official_form(Some(&official), accept::<OfficialField>);
        assert!(!form.is_required(OfficialField::Password));
        assert!(form.is_valid().expect("validity"));

        let payload = strip_blank_password(form.values().expect("values"));
        assert_eq!(payload.to_named().get("password"), None);
        assert_eq!(payload.get(OfficialField::OfficialId), &FieldValue::Number(3));

        let create = create_official_form(accept::<OfficialField>);
        assert!(create.is_required(OfficialField::Password));
    }

    #[test]
    fn document_request_checks_photo() {
        let form = document_request_form_with(
            I18nManager::with_locale("pl"),
            accept::<DocumentRequestField>,
        );
        assert_eq!(block_on(form.submit()).expect("submit"), SubmitOutcome::Invalid);
        assert_eq!(
            form.field_error(DocumentRequestField::Photo).expect("error"),
            Some("To pole jest wymagane".to_string())
        );

        form.handle_change(
            DocumentRequestField::Photo,
            FileRef::new("scan.pdf", "application/pdf", 1_000),
        )
        .expect("change");
        assert_eq!(
            form.field_error(DocumentRequestField::Photo).expect("error"),
            Some("Dozwolone formaty: JPEG, PNG, WebP".to_string())
        );

        form.handle_change(
            DocumentRequestField::Photo,
            FileRef::new("big.png", "image/png", MAX_PHOTO_SIZE + 1),
        )
        .expect("change");
        assert_eq!(
            form.field_error(DocumentRequestField::Photo).expect("error"),
            Some("Rozmiar pliku nie może przekraczać 5MB".to_string())
        );

        form.handle_change(
            DocumentRequestField::Photo,
            FileRef::new("face.jpg", "image/jpeg", 200_000),
        )
        .expect("change");
        form.handle_change(
            DocumentRequestField::LicenseCategory,
            vec!["B".to_string(), "Z".to_string()],
        )
        .expect("change");
        assert!(
            form.field_error(DocumentRequestField::LicenseCategory)
                .expect("error")
                .is_some()
        );
        form.handle_change(DocumentRequestField::LicenseCategory, vec!["B".to_string()])
            .expect("change");

        assert_eq!(block_on(form.submit()).expect("submit"), SubmitOutcome::Succeeded);
    }

    #[test]
    fn login_form_starts_blank() {
        let form = login_form(accept::<LoginField>);
        let values = form.values().expect("values");
        assert_eq!(values.text(LoginField::Email), Some(""));
        assert_eq!(values.text(LoginField::Password), Some(""));
        assert!(!form.is_valid().expect("validity"));
    }
}
