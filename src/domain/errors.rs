//! Validation error collections
//!
//! Errors are stored as message *keys* (`blank`, `confirmation`, ...), never as
//! resolved text, so the same collection renders correctly in whatever locale
//! is active when it is read.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Value;

/// Attribute name used for errors that belong to the record as a whole
pub const BASE: &str = "base";

/// Message keys understood by the built-in catalog
pub mod keys {
    pub const BLANK: &str = "blank";
    pub const CONFIRMATION: &str = "confirmation";
    pub const INVALID: &str = "invalid";
    pub const TAKEN: &str = "taken";
    pub const NOT_SAVED: &str = "not_saved";
}

/// One validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Attribute the failure is reported against
    pub attribute: String,

    /// Catalog key for the message
    pub key: String,

    /// Literal message, bypassing the catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorEntry {
    pub fn new(attribute: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            key: key.into(),
            message: None,
        }
    }

    pub fn is_base(&self) -> bool {
        self.attribute == BASE
    }
}

/// Ordered collection of validation failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Errors {
    entries: Vec<ErrorEntry>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure by catalog key
    pub fn add(&mut self, attribute: impl Into<String>, key: impl Into<String>) {
        self.entries.push(ErrorEntry::new(attribute, key));
    }

    /// Record a failure with a fixed message
    pub fn add_message(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        self.entries.push(ErrorEntry {
            attribute: attribute.into(),
            key: keys::INVALID.to_string(),
            message: Some(message),
        });
    }

    pub fn push(&mut self, entry: ErrorEntry) {
        self.entries.push(entry);
    }

    /// Move every entry of `other` onto the end of this collection
    pub fn append(&mut self, mut other: Errors) {
        self.entries.append(&mut other.entries);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorEntry> {
        self.entries.iter()
    }

    /// All entries reported against `attribute`
    pub fn on(&self, attribute: &str) -> Vec<&ErrorEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.attribute == attribute)
            .collect()
    }

    /// Message keys reported against `attribute`
    pub fn keys_for(&self, attribute: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.attribute == attribute)
            .map(|entry| entry.key.as_str())
            .collect()
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.entries.iter().any(|entry| entry.attribute == attribute)
    }

    /// Distinct attributes with errors, in first-reported order
    pub fn attributes(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.attribute.as_str()) {
                seen.push(&entry.attribute);
            }
        }
        seen
    }

    /// Append every entry of `other`, renaming attributes on the way in.
    /// `other` is left untouched.
    pub fn merge_renamed<F>(&mut self, other: &Errors, rename: F)
    where
        F: Fn(&str) -> String,
    {
        for entry in &other.entries {
            self.entries.push(ErrorEntry {
                attribute: rename(&entry.attribute),
                key: entry.key.clone(),
                message: entry.message.clone(),
            });
        }
    }

    /// Stable sort by the position of each attribute in `order`; attributes
    /// missing from `order` keep their relative order at the end.
    pub fn sort_by_declaration(&mut self, order: &[&str]) {
        self.entries.sort_by_key(|entry| {
            order
                .iter()
                .position(|name| *name == entry.attribute)
                .unwrap_or(order.len())
        });
    }

    // =========================================================================
    // Validation helpers
    // =========================================================================

    /// Adds `blank` when the value is null or whitespace
    pub fn validate_presence(&mut self, attribute: &str, value: &Value) -> bool {
        if value.is_blank() {
            self.add(attribute, keys::BLANK);
            return false;
        }
        true
    }

    /// Adds `confirmation` against `confirmation_attribute` when a confirmation
    /// was given and differs from the value
    pub fn validate_confirmation(
        &mut self,
        confirmation_attribute: &str,
        value: &Value,
        confirmation: &Value,
    ) -> bool {
        if !confirmation.is_null() && value != confirmation {
            self.add(confirmation_attribute, keys::CONFIRMATION);
            return false;
        }
        true
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a ErrorEntry;
    type IntoIter = std::slice::Iter<'a, ErrorEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|entry| match &entry.message {
                Some(message) => format!("{} {}", entry.attribute, message),
                None => format!("{} {}", entry.attribute, entry.key),
            })
            .collect();
        f.write_str(&parts.join(", "))
    }
}
