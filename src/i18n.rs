use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use regex::{Captures, Regex};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/mobywatel_i18n_generated.rs"));
}

static CATALOG: LazyLock<Arc<I18nCatalog>> = LazyLock::new(|| Arc::new(I18nCatalog::load()));

#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub enum Locale {
    #[default]
    System,
    Tag(String),
}

impl From<String> for Locale {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("system") {
            return Self::System;
        }
        Self::Tag(value.trim().to_string())
    }
}

impl From<&str> for Locale {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

#[derive(Clone)]
pub struct I18nManager {
    catalog: Arc<I18nCatalog>,
    locale: Arc<RwLock<Locale>>,
}

impl Default for I18nManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for I18nManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I18nManager")
            .field("locale", &self.locale())
            .field("resolved", &self.resolved_locale())
            .finish()
    }
}

impl I18nManager {
    pub fn new() -> Self {
        Self {
            catalog: CATALOG.clone(),
            locale: Arc::new(RwLock::new(Locale::System)),
        }
    }

    pub fn with_locale(locale: impl Into<Locale>) -> Self {
        let manager = Self::new();
        manager.set_locale(locale);
        manager
    }

    pub fn locale(&self) -> Locale {
        match self.locale.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_locale(&self, locale: impl Into<Locale>) {
        let mut guard = match self.locale.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = locale.into();
    }

    pub fn default_locale(&self) -> &'static str {
        self.catalog.default_locale
    }

    pub fn resolved_locale(&self) -> &'static str {
        self.catalog
            .resolve_locale(self.requested_locale().as_deref())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn t(&self, key: &str) -> String {
        self.lookup(key).unwrap_or(key).to_string()
    }

    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let raw = self.lookup(key).unwrap_or(key);
        if params.is_empty() {
            return raw.to_string();
        }
        format_template(raw, params)
    }

    fn requested_locale(&self) -> Option<String> {
        match self.locale() {
            Locale::System => system_locale(),
            Locale::Tag(tag) => Some(tag),
        }
    }

    fn lookup(&self, key: &str) -> Option<&'static str> {
        let resolved = self.resolved_locale();
        self.catalog
            .lookup(resolved, key)
            .or_else(|| self.catalog.lookup(self.catalog.default_locale, key))
    }
}

#[cfg(feature = "i18n")]
fn system_locale() -> Option<String> {
    sys_locale::get_locale()
}

#[cfg(not(feature = "i18n"))]
fn system_locale() -> Option<String> {
    None
}

struct I18nCatalog {
    default_locale: &'static str,
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
    aliases: HashMap<String, &'static str>,
}

impl I18nCatalog {
    fn load() -> Self {
        let mut messages = HashMap::new();
        let mut aliases = HashMap::new();
        let mut languages: HashMap<String, Vec<&'static str>> = HashMap::new();

        for &(locale, entries) in generated::LOCALES {
            let tag = normalize_locale_tag(locale);
            let language = language_of(&tag).to_string();
            languages.entry(language).or_default().push(locale);
            aliases.insert(tag, locale);
            messages.insert(locale, entries.iter().copied().collect());
        }
        for (language, locales) in languages {
            if let [locale] = locales.as_slice() {
                aliases.entry(language).or_insert(*locale);
            }
        }
        messages.entry(generated::DEFAULT_LOCALE).or_default();
        aliases
            .entry(normalize_locale_tag(generated::DEFAULT_LOCALE))
            .or_insert(generated::DEFAULT_LOCALE);

        Self {
            default_locale: generated::DEFAULT_LOCALE,
            messages,
            aliases,
        }
    }

    fn resolve_locale(&self, requested: Option<&str>) -> &'static str {
        let Some(tag) = requested.map(normalize_locale_tag) else {
            return self.default_locale;
        };
        self.aliases
            .get(&tag)
            .or_else(|| self.aliases.get(language_of(&tag)))
            .copied()
            .unwrap_or(self.default_locale)
    }

    fn lookup(&self, locale: &str, key: &str) -> Option<&'static str> {
        self.messages.get(locale)?.get(key).copied()
    }
}

fn language_of(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

fn normalize_locale_tag(tag: &str) -> String {
    let tag = tag.trim();
    let tag = tag.split(['.', '@']).next().unwrap_or(tag);
    tag.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

fn format_template(template: &str, params: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |captures: &Captures<'_>| {
            let name = &captures[1];
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}
