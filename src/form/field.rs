use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

pub trait FormField: Copy + Ord + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    fn name(self) -> &'static str;
    fn from_name(name: &str) -> Option<Self>;
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

impl FileRef {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Number(u64),
    File(Option<FileRef>),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Flag(flag) => !flag,
            FieldValue::Number(_) => false,
            FieldValue::File(file) => file.is_none(),
            FieldValue::List(items) => items.is_empty(),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<FileRef> for FieldValue {
    fn from(value: FileRef) -> Self {
        FieldValue::File(Some(value))
    }
}

impl From<Option<FileRef>> for FieldValue {
    fn from(value: Option<FileRef>) -> Self {
        FieldValue::File(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

static BLANK: FieldValue = FieldValue::Text(String::new());

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormValues<F: FormField> {
    values: BTreeMap<F, FieldValue>,
}

impl<F: FormField> Default for FormValues<F> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<F: FormField> FormValues<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blank() -> Self {
        F::ALL.iter().map(|field| (*field, FieldValue::default())).collect()
    }

    pub fn with(mut self, field: F, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: F, value: impl Into<FieldValue>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: F) -> &FieldValue {
        self.values.get(&field).unwrap_or(&BLANK)
    }

    pub fn text(&self, field: F) -> Option<&str> {
        self.get(field).as_text()
    }

    pub fn remove(&mut self, field: F) -> Option<FieldValue> {
        self.values.remove(&field)
    }

    pub fn is_blank(&self, field: F) -> bool {
        self.get(field).is_blank()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &FieldValue)> {
        self.values.iter().map(|(field, value)| (*field, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_named(&self) -> BTreeMap<&'static str, FieldValue> {
        self.values
            .iter()
            .map(|(field, value)| (field.name(), value.clone()))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.to_named()).unwrap_or(serde_json::Value::Null)
    }
}

impl<F: FormField, V: Into<FieldValue>> FromIterator<(F, V)> for FormValues<F> {
    fn from_iter<I: IntoIterator<Item = (F, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(field, value)| (field, value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, crate::form::FormField)]
    enum Demo {
        Email,
        #[field(rename = "PESEL")]
        Pesel,
        Photo,
        Categories,
    }

    #[test]
    fn derive_uses_camel_case_and_rename() {
        assert_eq!(Demo::Email.name(), "email");
        assert_eq!(Demo::Pesel.name(), "PESEL");
        assert_eq!(Demo::from_name("PESEL"), Some(Demo::Pesel));
        assert_eq!(Demo::from_name("pesel"), None);
        assert_eq!(Demo::ALL.len(), 4);
    }

    #[test]
    fn blankness_follows_value_kind() {
        assert!(FieldValue::from("   ").is_blank());
        assert!(!FieldValue::from(" a ").is_blank());
        assert!(FieldValue::from(false).is_blank());
        assert!(!FieldValue::from(true).is_blank());
        assert!(FieldValue::File(None).is_blank());
        assert!(!FieldValue::from(FileRef::new("a.png", "image/png", 10)).is_blank());
        assert!(FieldValue::List(Vec::new()).is_blank());
        assert!(!FieldValue::from(0_u64).is_blank());
    }

    #[test]
    fn missing_fields_read_as_blank() {
        let values = FormValues::<Demo>::new().with(Demo::Email, "a@b.pl");
        assert_eq!(values.text(Demo::Email), Some("a@b.pl"));
        assert!(values.is_blank(Demo::Pesel));
        assert_eq!(FormValues::<Demo>::blank().len(), 4);
    }

    #[test]
    fn json_uses_wire_names() {
        let values = FormValues::<Demo>::new()
            .with(Demo::Pesel, "44051401359")
            .with(Demo::Categories, vec!["B".to_string()])
            .with(Demo::Photo, None::<FileRef>)
            .with(Demo::Email, 7_u64);
        assert_eq!(
            values.to_json(),
            serde_json::json!({
                "email": 7,
                "PESEL": "44051401359",
                "categories": ["B"],
                "photo": null
            })
        );
    }
}
