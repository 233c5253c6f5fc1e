//! Locales, message catalogs and attribute labels
//!
//! Message text is looked up by (key, locale) on every read. Labels are
//! locale independent.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::errors::keys;

/// Locale identifier, e.g. `en` or `1337`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn english() -> Self {
        Self::new("en")
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locale {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Resolves error message keys to display text
pub trait MessageCatalog {
    fn message_for(&self, key: &str, locale: &Locale) -> Option<String>;
}

/// Resolves attribute names to display labels
pub trait LabelLookup {
    fn label_for(&self, attribute: &str) -> String;
}

/// In-memory message catalog with a fallback locale.
///
/// Starts with the English messages for every key in [`keys`]; further
/// locales are loaded from JSON shaped as `{"<locale>": {"<key>": "<text>"}}`.
#[derive(Debug, Clone)]
pub struct Catalog {
    messages: HashMap<String, HashMap<String, String>>,
    fallback: Locale,
}

impl Catalog {
    /// Empty catalog with no fallback messages
    pub fn empty(fallback: Locale) -> Self {
        Self {
            messages: HashMap::new(),
            fallback,
        }
    }

    /// Catalog preloaded with the English messages
    pub fn english() -> Self {
        let mut catalog = Self::empty(Locale::english());
        let en = Locale::english();
        catalog.insert(&en, keys::BLANK, "can't be blank");
        catalog.insert(&en, keys::CONFIRMATION, "doesn't match confirmation");
        catalog.insert(&en, keys::INVALID, "is invalid");
        catalog.insert(&en, keys::TAKEN, "has already been taken");
        catalog.insert(&en, keys::NOT_SAVED, "could not be saved");
        catalog
    }

    pub fn insert(&mut self, locale: &Locale, key: &str, message: impl Into<String>) {
        self.messages
            .entry(locale.code().to_string())
            .or_default()
            .insert(key.to_string(), message.into());
    }

    /// Builder form of [`Catalog::insert`]
    pub fn with_message(mut self, locale: &Locale, key: &str, message: impl Into<String>) -> Self {
        self.insert(locale, key, message);
        self
    }

    /// Merge messages from a JSON document over the existing ones
    pub fn load_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let parsed: HashMap<String, HashMap<String, String>> = serde_json::from_str(json)?;
        for (locale, messages) in parsed {
            self.messages.entry(locale).or_default().extend(messages);
        }
        Ok(())
    }

    pub fn locales(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.messages.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    fn lookup(&self, key: &str, locale: &str) -> Option<&String> {
        self.messages.get(locale).and_then(|messages| messages.get(key))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::english()
    }
}

impl MessageCatalog for Catalog {
    fn message_for(&self, key: &str, locale: &Locale) -> Option<String> {
        self.lookup(key, locale.code())
            .or_else(|| self.lookup(key, self.fallback.code()))
            .cloned()
    }
}

/// Labels derived by humanizing attribute names, with explicit overrides
#[derive(Debug, Clone, Default)]
pub struct HumanizedLabels {
    overrides: HashMap<String, String>,
}

impl HumanizedLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, attribute: impl Into<String>, label: impl Into<String>) -> Self {
        self.overrides.insert(attribute.into(), label.into());
        self
    }
}

impl LabelLookup for HumanizedLabels {
    fn label_for(&self, attribute: &str) -> String {
        self.overrides
            .get(attribute)
            .cloned()
            .unwrap_or_else(|| humanize(attribute))
    }
}

/// `user_login` -> `User login`, `account_id` -> `Account`
pub fn humanize(attribute: &str) -> String {
    let trimmed = attribute.strip_suffix("_id").unwrap_or(attribute);
    let spaced = trimmed.replace('_', " ");
    let spaced = spaced.trim();
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("user_login"), "User login");
        assert_eq!(humanize("login"), "Login");
        assert_eq!(humanize("account_id"), "Account");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_label_override() {
        let labels = HumanizedLabels::new().with_label("user_password", "User Password");

        assert_eq!(labels.label_for("user_password"), "User Password");
        assert_eq!(labels.label_for("user_login"), "User login");
    }

    #[test]
    fn test_catalog_falls_back_to_english() {
        let leet = Locale::new("1337");
        let catalog = Catalog::english().with_message(&leet, keys::BLANK, "c4N n07 83 8L4nK");

        assert_eq!(catalog.message_for(keys::BLANK, &leet).as_deref(), Some("c4N n07 83 8L4nK"));
        assert_eq!(catalog.message_for(keys::TAKEN, &leet).as_deref(), Some("has already been taken"));
        assert_eq!(catalog.message_for("unheard_of", &leet), None);
    }

    #[test]
    fn test_catalog_loads_json() {
        let mut catalog = Catalog::english();
        catalog
            .load_json(r#"{"fr": {"blank": "doit être rempli(e)"}}"#)
            .unwrap();

        assert_eq!(
            catalog.message_for(keys::BLANK, &Locale::new("fr")).as_deref(),
            Some("doit être rempli(e)")
        );
        assert_eq!(catalog.locales(), vec!["en", "fr"]);
    }
}
