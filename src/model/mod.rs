//! Model module
//!
//! The record contract every presenter slot is backed by, plus the
//! `User` and `Account` records used by the sign-up flow.

pub mod account;
pub mod user;

pub use account::Account;
pub use user::User;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

use crate::domain::{AttributeKind, Errors, Value, ValueError};
use crate::store::{Row, StoreResult, Transaction};

/// A record shared between a presenter and its caller
pub type SharedRecord = Rc<RefCell<dyn Record>>;

/// Wrap a record for use in a presenter slot
pub fn shared<R: Record + 'static>(record: R) -> Rc<RefCell<R>> {
    Rc::new(RefCell::new(record))
}

/// Declared attribute of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDef {
    pub name: &'static str,
    pub kind: AttributeKind,
}

impl AttributeDef {
    pub const fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self { name, kind }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Text)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Timestamp)
    }
}

/// Persistence bookkeeping every record carries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordState {
    id: Option<Uuid>,
    persisted: bool,
    changed: BTreeSet<String>,
    errors: Errors,
}

/// Restorable part of a [`RecordState`]
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    id: Option<Uuid>,
    persisted: bool,
    changed: BTreeSet<String>,
}

impl RecordState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn is_new_record(&self) -> bool {
        !self.persisted
    }

    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    pub fn set_errors(&mut self, errors: Errors) {
        self.errors = errors;
    }

    pub fn is_changed(&self) -> bool {
        !self.changed.is_empty()
    }

    pub fn attribute_changed(&self, attribute: &str) -> bool {
        self.changed.contains(attribute)
    }

    pub fn changed_attributes(&self) -> Vec<&str> {
        self.changed.iter().map(String::as_str).collect()
    }

    /// Flag `attribute` dirty if `old` and `new` differ
    pub fn track(&mut self, attribute: &str, old: &Value, new: &Value) {
        if old != new {
            self.changed.insert(attribute.to_string());
        }
    }

    pub fn mark_persisted(&mut self, id: Uuid) {
        self.id = Some(id);
        self.persisted = true;
        self.changed.clear();
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            id: self.id,
            persisted: self.persisted,
            changed: self.changed.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: StateSnapshot) {
        self.id = snapshot.id;
        self.persisted = snapshot.persisted;
        self.changed = snapshot.changed;
    }
}

/// Contract for records a presenter can bind into a slot.
///
/// Implementors provide typed attribute access, their own validations and a
/// row representation; persistence and validation bookkeeping come from the
/// provided methods.
pub trait Record: fmt::Debug {
    /// Model name, e.g. `User`
    fn model_name(&self) -> &'static str;

    /// Store table the record persists into
    fn table_name(&self) -> &'static str;

    /// Attributes in declaration order
    fn attribute_defs(&self) -> &'static [AttributeDef];

    /// Current value of a declared attribute, `None` if undeclared
    fn read_attribute(&self, name: &str) -> Option<Value>;

    /// Cast and assign a declared attribute
    fn write_attribute(&mut self, name: &str, value: Value) -> Result<(), ValueError>;

    fn state(&self) -> &RecordState;

    fn state_mut(&mut self) -> &mut RecordState;

    /// Record-specific validations
    fn check(&self, errors: &mut Errors);

    /// Row written to the store
    fn to_row(&self) -> Row {
        self.attribute_defs()
            .iter()
            .map(|def| {
                let value = self.read_attribute(def.name).unwrap_or_default();
                (def.name.to_string(), value)
            })
            .collect()
    }

    fn attribute_kind(&self, name: &str) -> Option<AttributeKind> {
        self.attribute_defs()
            .iter()
            .find(|def| def.name == name)
            .map(|def| def.kind)
    }

    fn id(&self) -> Option<Uuid> {
        self.state().id()
    }

    fn is_new_record(&self) -> bool {
        self.state().is_new_record()
    }

    fn is_changed(&self) -> bool {
        self.state().is_changed()
    }

    fn errors(&self) -> &Errors {
        self.state().errors()
    }

    /// Re-run validations, replacing the record's own errors
    fn validate(&mut self) -> bool {
        let mut errors = Errors::new();
        self.check(&mut errors);
        let valid = errors.is_empty();
        self.state_mut().set_errors(errors);
        valid
    }

    /// Validate, then stage a create or update on `tx`.
    ///
    /// `Ok(false)` means the record refused to save.
    fn save(&mut self, tx: &mut Transaction) -> StoreResult<bool> {
        persist_record(self, tx)
    }
}

/// The create-or-update step behind [`Record::save`], usable from overrides
pub fn persist_record<R: Record + ?Sized>(record: &mut R, tx: &mut Transaction) -> StoreResult<bool> {
    if !record.validate() {
        return Ok(false);
    }

    let row = record.to_row();
    let table = record.table_name();
    let id = match record.id() {
        Some(id) if !record.is_new_record() => {
            tx.update(table, id, row)?;
            id
        }
        _ => tx.insert(table, row)?,
    };

    record.state_mut().mark_persisted(id);
    tracing::debug!(model = record.model_name(), %id, "Record staged");
    Ok(true)
}

/// Cast `value` with `extract` and store it in `field`, tracking the change
pub fn assign<T>(
    state: &mut RecordState,
    attribute: &str,
    field: &mut T,
    value: Value,
    extract: fn(Value) -> Result<T, ValueError>,
) -> Result<(), ValueError>
where
    T: Clone + Into<Value>,
{
    let new = extract(value)?;
    state.track(attribute, &field.clone().into(), &new.clone().into());
    *field = new;
    Ok(())
}
