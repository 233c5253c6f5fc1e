//! Attribute values
//!
//! Loosely-typed values exchanged between callers, presenters and records.
//! Records cast incoming values to the kind they declare for each attribute.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute mapping keyed by virtual attribute name, kept in input order.
pub type Attributes = IndexMap<String, Value>;

/// Declared type of a record attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Text,
    Integer,
    Boolean,
    Timestamp,
    Date,
}

impl AttributeKind {
    /// Whether values of this kind can be assembled from `base(Ni)` fragments
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Timestamp | Self::Date)
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
        };
        f.write_str(name)
    }
}

/// A single attribute value.
///
/// Deserializes from plain JSON scalars, so a request body such as
/// `{"user_login": "alice", "user_age": 30}` maps straight onto [`Attributes`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
}

/// Errors raised when a value cannot be cast to an attribute's kind
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("expected a {expected} value, got {found}")]
    TypeMismatch {
        expected: AttributeKind,
        found: &'static str,
    },

    #[error("cannot parse '{input}' as {expected}")]
    Parse {
        input: String,
        expected: AttributeKind,
    },

    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Date(_) => "date",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Null, or text made only of whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_present(&self) -> bool {
        !self.is_blank()
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Cast to the given kind. Blank text casts to `Null` for every
    /// non-text kind.
    pub fn cast(self, kind: AttributeKind) -> Result<Value, ValueError> {
        Ok(match kind {
            AttributeKind::Text => self.into_text()?.map(Value::Text),
            AttributeKind::Integer => self.into_integer()?.map(Value::Integer),
            AttributeKind::Boolean => self.into_boolean()?.map(Value::Boolean),
            AttributeKind::Timestamp => self.into_timestamp()?.map(Value::Timestamp),
            AttributeKind::Date => self.into_date()?.map(Value::Date),
        }
        .unwrap_or(Value::Null))
    }

    pub fn into_text(self) -> Result<Option<String>, ValueError> {
        Ok(match self {
            Self::Null => None,
            Self::Text(text) => Some(text),
            Self::Boolean(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(n) => Some(n.to_string()),
            Self::Timestamp(ts) => Some(ts.to_rfc3339()),
            Self::Date(date) => Some(date.to_string()),
        })
    }

    pub fn into_integer(self) -> Result<Option<i64>, ValueError> {
        match self {
            Self::Null => Ok(None),
            Self::Integer(i) => Ok(Some(i)),
            Self::Text(ref text) if text.trim().is_empty() => Ok(None),
            Self::Text(text) => text.trim().parse().map(Some).map_err(|_| ValueError::Parse {
                input: text,
                expected: AttributeKind::Integer,
            }),
            other => Err(ValueError::TypeMismatch {
                expected: AttributeKind::Integer,
                found: other.type_name(),
            }),
        }
    }

    pub fn into_boolean(self) -> Result<Option<bool>, ValueError> {
        match self {
            Self::Null => Ok(None),
            Self::Boolean(b) => Ok(Some(b)),
            Self::Integer(i) => Ok(Some(i != 0)),
            Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "" => Ok(None),
                "1" | "t" | "true" | "on" | "yes" => Ok(Some(true)),
                "0" | "f" | "false" | "off" | "no" => Ok(Some(false)),
                _ => Err(ValueError::Parse {
                    input: text,
                    expected: AttributeKind::Boolean,
                }),
            },
            other => Err(ValueError::TypeMismatch {
                expected: AttributeKind::Boolean,
                found: other.type_name(),
            }),
        }
    }

    /// Accepts RFC 3339 text or `YYYY-MM-DD HH:MM:SS` (read as UTC).
    pub fn into_timestamp(self) -> Result<Option<DateTime<Utc>>, ValueError> {
        match self {
            Self::Null => Ok(None),
            Self::Timestamp(ts) => Ok(Some(ts)),
            Self::Date(date) => Ok(date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())),
            Self::Text(ref text) if text.trim().is_empty() => Ok(None),
            Self::Text(text) => {
                let trimmed = text.trim();
                if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
                    return Ok(Some(ts.with_timezone(&Utc)));
                }
                NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
                    .map(|naive| Some(naive.and_utc()))
                    .map_err(|_| ValueError::Parse {
                        input: text,
                        expected: AttributeKind::Timestamp,
                    })
            }
            other => Err(ValueError::TypeMismatch {
                expected: AttributeKind::Timestamp,
                found: other.type_name(),
            }),
        }
    }

    pub fn into_date(self) -> Result<Option<NaiveDate>, ValueError> {
        match self {
            Self::Null => Ok(None),
            Self::Date(date) => Ok(Some(date)),
            Self::Timestamp(ts) => Ok(Some(ts.date_naive())),
            Self::Text(ref text) if text.trim().is_empty() => Ok(None),
            Self::Text(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| ValueError::Parse {
                    input: text,
                    expected: AttributeKind::Date,
                }),
            other => Err(ValueError::TypeMismatch {
                expected: AttributeKind::Date,
                found: other.type_name(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(n) => write!(f, "{}", n),
            Self::Text(text) => f.write_str(text),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Date(date) => write!(f, "{}", date),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
