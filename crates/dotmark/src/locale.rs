//! Locale lookup. Only a small built-in table of locales is known.
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocalizationError {
    #[error("no locale matches '{0}'")]
    LocaleNotFound(String),
    #[error("no localization table named '{0}'")]
    TableNotFound(String),
    #[error("no entry '{key}' in localization table '{table}' for locale '{locale}'")]
    KeyNotFound {
        table: String,
        key: String,
        locale: String,
    },
    #[error("the document locale is not set")]
    LocaleUnset,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Locale {
    /// IETF language tag, such as `en-US`.
    pub tag: String,
    pub language: String,
    pub country: Option<String>,
    /// English name of the locale.
    pub display_name: String,
    /// Name of the locale in its own language.
    pub localized_name: String,
}

impl Locale {
    fn new(tag: &str, display_name: &str, localized_name: &str) -> Self {
        let (language, country) = match tag.split_once('-') {
            Some((language, country)) => (language, Some(country.to_string())),
            None => (tag, None),
        };
        Locale {
            tag: tag.to_string(),
            language: language.to_string(),
            country,
            display_name: display_name.to_string(),
            localized_name: localized_name.to_string(),
        }
    }
}

pub trait LocaleLoader {
    fn all(&self) -> Vec<Locale>;

    /// Looks up a locale by tag. Tags compare case-insensitively and accept `_` separators.
    fn from_tag(&self, tag: &str) -> Option<Locale> {
        let tag = tag.trim().replace('_', "-");
        self.all()
            .into_iter()
            .find(|l| l.tag.eq_ignore_ascii_case(&tag))
    }

    /// Looks up a locale by its English or native name.
    fn from_name(&self, name: &str) -> Option<Locale> {
        let name = name.trim();
        self.all().into_iter().find(|l| {
            l.display_name.eq_ignore_ascii_case(name) || l.localized_name.eq_ignore_ascii_case(name)
        })
    }

    /// Looks up a locale by tag, then by name.
    fn find(&self, query: &str) -> Option<Locale> {
        self.from_tag(query).or_else(|| self.from_name(query))
    }
}

const BUILTIN_LOCALES: &[(&str, &str, &str)] = &[
    ("en", "English", "English"),
    ("en-US", "English (United States)", "English (United States)"),
    ("en-GB", "English (United Kingdom)", "English (United Kingdom)"),
    ("it", "Italian", "Italiano"),
    ("fr", "French", "Français"),
    ("fr-CA", "French (Canada)", "Français (Canada)"),
    ("de", "German", "Deutsch"),
    ("es", "Spanish", "Español"),
    ("pt", "Portuguese", "Português"),
    ("ja", "Japanese", "日本語"),
    ("zh", "Chinese", "中文"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLocaleLoader;

impl LocaleLoader for BuiltinLocaleLoader {
    fn all(&self) -> Vec<Locale> {
        BUILTIN_LOCALES
            .iter()
            .map(|(tag, display, localized)| Locale::new(tag, display, localized))
            .collect()
    }
}
