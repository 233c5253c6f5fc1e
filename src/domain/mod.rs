//! Domain module
//!
//! Values, validation errors and message lookup shared by records and
//! presenters.

pub mod errors;
pub mod locale;
pub mod value;

pub use errors::{keys, ErrorEntry, Errors, BASE};
pub use locale::{humanize, Catalog, HumanizedLabels, LabelLookup, Locale, MessageCatalog};
pub use value::{AttributeKind, Attributes, Value, ValueError};
