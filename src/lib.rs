//! signup_presenter Library
//!
//! Composite-record presenters: bind several records into one object with a
//! shared attribute surface, a merged error set and a transactional save.

pub mod config;
pub mod domain;
pub mod model;
pub mod presenter;
pub mod store;

mod error;

pub use config::{Config, ConfigError};
pub use domain::{Attributes, Errors, Locale, Value};
pub use error::{PresenterError, PresenterResult};
pub use model::{Record, SharedRecord};
pub use presenter::{Flow, Presenter, PresenterDefinition, SaveOutcome, Stage};
pub use store::{Store, StoreError};
