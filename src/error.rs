//! Error handling module
//!
//! Centralized error types for presenters.

use crate::domain::{Errors, ValueError};

/// Presenter-wide Result type
pub type PresenterResult<T> = Result<T, PresenterError>;

/// Presenter error types
#[derive(Debug, thiserror::Error)]
pub enum PresenterError {
    // Programmer errors: raised from every entry point
    #[error("Unknown attribute '{attribute}' for {presenter}")]
    UnknownAttribute {
        presenter: String,
        attribute: String,
    },

    #[error("Unknown slot '{slot}' for {presenter}")]
    UnknownSlot { presenter: String, slot: String },

    #[error("Slot '{slot}' is defined more than once for {presenter}")]
    DuplicateSlot { presenter: String, slot: String },

    #[error("Slot '{slot}' of {presenter} holds no record")]
    EmptySlot { presenter: String, slot: String },

    #[error("Slot '{slot}' expects a {expected} record, got {found}")]
    SlotTypeMismatch {
        slot: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid value for '{attribute}': {source}")]
    InvalidValue {
        attribute: String,
        #[source]
        source: ValueError,
    },

    #[error("Invalid multi-part value for '{attribute}': {reason}")]
    InvalidComposite { attribute: String, reason: String },

    // Lifecycle failures: raised only by `save_strict`
    #[error("Validation failed: {errors}")]
    RecordInvalid { errors: Errors },

    #[error("Record not saved: {reason}")]
    RecordNotSaved { reason: String, errors: Errors },
}

impl PresenterError {
    pub(crate) fn invalid_composite(attribute: &str, reason: impl Into<String>) -> Self {
        Self::InvalidComposite {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }

    /// Error set carried by lifecycle failures
    pub fn errors(&self) -> Option<&Errors> {
        match self {
            Self::RecordInvalid { errors } | Self::RecordNotSaved { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Check if this is a routing or assignment error (caller's fault)
    pub fn is_programmer_error(&self) -> bool {
        !matches!(self, Self::RecordInvalid { .. } | Self::RecordNotSaved { .. })
    }
}
