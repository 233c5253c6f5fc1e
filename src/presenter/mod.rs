//! Presenter module
//!
//! A presenter binds several records into one object: one attribute surface,
//! one error surface, and one save lifecycle that persists every record in a
//! single transaction.
//!
//! ```text
//! attributes ──► routing table ──► slot records
//!                    │
//!             composite assembly (base(Ni) keys)
//!
//! save ──► before_validation ──► validate ──► before_save ──► persist ──► after_save
//! ```

pub mod composite;
pub mod definition;
pub mod lifecycle;
pub mod messages;
pub mod persister;
pub mod routing;

pub use definition::{
    CollisionPolicy, DefinitionBuilder, Flow, Hook, NamingMode, PresenterDefinition, RecordFactory,
    SlotDef, Stage, Validator,
};
pub use lifecycle::SaveOutcome;
pub use persister::{PersistFailure, PersistOutcome};
pub use routing::{Collision, Resolution, Route, RoutingTable};

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

use crate::domain::{Attributes, Errors, Value, ValueError};
use crate::error::{PresenterError, PresenterResult};
use crate::model::{Record, SharedRecord};
use crate::store::Store;

use composite::Parts;

/// Non-attribute names a presenter answers to
const LIFECYCLE_METHODS: &[&str] = &[
    "attributes=",
    "changed?",
    "errors",
    "id",
    "new_record?",
    "save",
    "save!",
    "update_attributes",
    "valid?",
];

/// A live composite record
#[derive(Debug)]
pub struct Presenter {
    definition: Rc<PresenterDefinition>,
    store: Store,
    /// `None` for a slot left empty
    slots: Vec<Option<SharedRecord>>,
    own_values: Vec<Value>,
    errors: Errors,
    trace: Vec<Stage>,
}

impl Presenter {
    /// Build a presenter with fresh records in every slot, then assign
    /// `attributes`. `None` behaves like an empty mapping.
    pub fn new(
        definition: Rc<PresenterDefinition>,
        store: Store,
        attributes: Option<Attributes>,
    ) -> PresenterResult<Self> {
        let mut builder = Self::builder(definition, store);
        if let Some(attributes) = attributes {
            builder = builder.attributes(attributes);
        }
        builder.build()
    }

    pub fn builder(definition: Rc<PresenterDefinition>, store: Store) -> PresenterBuilder {
        PresenterBuilder {
            definition,
            store,
            records: Vec::new(),
            attributes: None,
        }
    }

    pub fn definition(&self) -> &PresenterDefinition {
        &self.definition
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // =========================================================================
    // Attribute access
    // =========================================================================

    pub fn read(&self, name: &str) -> PresenterResult<Value> {
        match self.definition.routes().resolve(name) {
            Resolution::Attribute(route) => self.read_route(route),
            _ => Err(self.unknown_attribute(name)),
        }
    }

    /// Write one attribute. Composite fragment keys are accepted and
    /// assembled on their own.
    pub fn write(&mut self, name: &str, value: impl Into<Value>) -> PresenterResult<()> {
        let value = value.into();
        match self.definition.routes().resolve(name) {
            Resolution::Attribute(route) => self.write_route(name, route, value),
            Resolution::Composite { .. } => {
                let mut attributes = Attributes::new();
                attributes.insert(name.to_string(), value);
                self.assign_attributes(Some(attributes))
            }
            Resolution::NotFound => Err(self.unknown_attribute(name)),
        }
    }

    /// The `name?` form: whether the attribute holds a meaningful value
    pub fn query(&self, name: &str) -> PresenterResult<bool> {
        Ok(match self.read(name)? {
            Value::Null => false,
            Value::Boolean(flag) => flag,
            Value::Integer(number) => number != 0,
            Value::Float(number) => number != 0.0,
            Value::Text(text) => !text.trim().is_empty(),
            Value::Timestamp(_) | Value::Date(_) => true,
        })
    }

    /// Bulk assignment.
    ///
    /// Every key is resolved, cast and, for composites, assembled before
    /// anything is written, so a failing key leaves the presenter untouched.
    /// Plain keys are written in input order, then composites.
    pub fn assign_attributes(&mut self, attributes: Option<Attributes>) -> PresenterResult<()> {
        let Some(attributes) = attributes else {
            return Ok(());
        };

        let mut plain: Vec<(String, Route, Value)> = Vec::new();
        let mut fragments: IndexMap<String, (Route, Parts)> = IndexMap::new();

        for (key, value) in attributes {
            match self.definition.routes().resolve(&key) {
                Resolution::Attribute(route) => {
                    let value = self.prepare(&key, route, value)?;
                    plain.push((key.clone(), route, value));
                }
                Resolution::Composite {
                    route,
                    base,
                    fragment,
                } => {
                    let (_, parts) = fragments
                        .entry(base.to_string())
                        .or_insert_with(|| (route, Parts::new()));
                    parts.insert(fragment.position, (fragment.cast, value));
                }
                Resolution::NotFound => return Err(self.unknown_attribute(&key)),
            }
        }

        let mut assembled: Vec<(String, Route, Value)> = Vec::with_capacity(fragments.len());
        for (base, (route, parts)) in fragments {
            let kind = route.kind().ok_or_else(|| {
                PresenterError::invalid_composite(&base, "untyped attributes cannot be assembled from parts")
            })?;
            let value = composite::assemble(&base, kind, &parts)?;
            let value = self.prepare(&base, route, value)?;
            assembled.push((base, route, value));
        }

        for (name, route, value) in plain.into_iter().chain(assembled) {
            self.write_route(&name, route, value)?;
        }
        Ok(())
    }

    /// Assign, then save. Assignment errors surface before any save.
    pub fn update_attributes(&mut self, attributes: Attributes) -> PresenterResult<bool> {
        self.assign_attributes(Some(attributes))?;
        Ok(self.save())
    }

    /// Every exposed attribute with its current value. Attributes of empty
    /// slots are left out.
    pub fn attributes(&self) -> Attributes {
        self.definition
            .routes()
            .names()
            .filter_map(|name| {
                let route = self.definition.routes().get(name)?;
                let value = self.read_route(route).ok()?;
                Some((name.to_string(), value))
            })
            .collect()
    }

    /// Whether the presenter answers to `name`, in reader, writer (`name=`)
    /// or query (`name?`) form, as a slot accessor (`user`, `user=`,
    /// `user_errors`), or as a lifecycle method
    pub fn responds_to(&self, name: &str) -> bool {
        if LIFECYCLE_METHODS.contains(&name) {
            return true;
        }

        let base = name
            .strip_suffix('=')
            .or_else(|| name.strip_suffix('?'))
            .unwrap_or(name);
        if self.definition.routes().contains(base) {
            return true;
        }

        let is_slot = |candidate: &str| self.definition.slot_index(candidate).is_some();
        match name.strip_suffix('=') {
            Some(slot) => is_slot(slot),
            None => base == name && (is_slot(name) || name.strip_suffix("_errors").is_some_and(is_slot)),
        }
    }

    // =========================================================================
    // Slots
    // =========================================================================

    /// Record bound to `slot`
    pub fn record(&self, slot: &str) -> PresenterResult<SharedRecord> {
        let index = self.slot_index(slot)?;
        self.bound(index).map(Rc::clone)
    }

    /// Bind `record` into `slot`, replacing whatever it held
    pub fn set_record<R: Record + 'static>(&mut self, slot: &str, record: Rc<RefCell<R>>) -> PresenterResult<()> {
        let index = self.slot_index(slot)?;
        let record = record as SharedRecord;
        check_model(&self.definition, index, &record)?;
        self.slots[index] = Some(record);
        Ok(())
    }

    /// Leave `slot` without a record; it is skipped by validation and save
    pub fn clear_record(&mut self, slot: &str) -> PresenterResult<()> {
        let index = self.slot_index(slot)?;
        self.slots[index] = None;
        Ok(())
    }

    pub fn has_record(&self, slot: &str) -> bool {
        self.definition
            .slot_index(slot)
            .is_some_and(|index| self.slots[index].is_some())
    }

    /// Copy of the own errors of the record in `slot`; empty for an empty slot
    pub fn slot_errors(&self, slot: &str) -> PresenterResult<Errors> {
        let index = self.slot_index(slot)?;
        Ok(self.slots[index]
            .as_ref()
            .map(|record| record.borrow().errors().clone())
            .unwrap_or_default())
    }

    /// Id of the first bound slot's record
    pub fn id(&self) -> Option<Uuid> {
        self.bound_records().next().and_then(|record| record.borrow().id())
    }

    /// True while no bound record has been saved
    pub fn new_record(&self) -> bool {
        self.bound_records().all(|record| record.borrow().is_new_record())
    }

    /// True when any bound record has unsaved changes
    pub fn changed(&self) -> bool {
        self.bound_records().any(|record| record.borrow().is_changed())
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn slot_index(&self, slot: &str) -> PresenterResult<usize> {
        self.definition
            .slot_index(slot)
            .ok_or_else(|| PresenterError::UnknownSlot {
                presenter: self.definition.name().to_string(),
                slot: slot.to_string(),
            })
    }

    fn bound_records(&self) -> impl Iterator<Item = &SharedRecord> {
        self.slots.iter().flatten()
    }

    fn bound(&self, index: usize) -> PresenterResult<&SharedRecord> {
        self.slots[index]
            .as_ref()
            .ok_or_else(|| PresenterError::EmptySlot {
                presenter: self.definition.name().to_string(),
                slot: self.definition.slots()[index].name().to_string(),
            })
    }

    /// Check the target slot is bound and cast `value` to its declared kind
    fn prepare(&self, name: &str, route: Route, value: Value) -> PresenterResult<Value> {
        match route {
            Route::Slot { slot, kind, .. } => {
                self.bound(slot)?;
                value.cast(kind).map_err(|source| PresenterError::InvalidValue {
                    attribute: name.to_string(),
                    source,
                })
            }
            Route::Own { .. } => Ok(value),
        }
    }

    fn read_route(&self, route: Route) -> PresenterResult<Value> {
        match route {
            Route::Slot { slot, local, .. } => Ok(self
                .bound(slot)?
                .borrow()
                .read_attribute(local)
                .unwrap_or_default()),
            Route::Own { index } => Ok(self.own_values[index].clone()),
        }
    }

    fn write_route(&mut self, name: &str, route: Route, value: Value) -> PresenterResult<()> {
        match route {
            Route::Slot { slot, local, .. } => self
                .bound(slot)?
                .borrow_mut()
                .write_attribute(local, value)
                .map_err(|source| match source {
                    ValueError::UnknownAttribute(_) => self.unknown_attribute(name),
                    source => PresenterError::InvalidValue {
                        attribute: name.to_string(),
                        source,
                    },
                }),
            Route::Own { index } => {
                self.own_values[index] = value;
                Ok(())
            }
        }
    }

    fn unknown_attribute(&self, name: &str) -> PresenterError {
        PresenterError::UnknownAttribute {
            presenter: self.definition.name().to_string(),
            attribute: name.to_string(),
        }
    }
}

fn check_model(definition: &PresenterDefinition, index: usize, record: &SharedRecord) -> PresenterResult<()> {
    let slot = &definition.slots()[index];
    let found = record.borrow().model_name();
    if slot.model_name() != found {
        return Err(PresenterError::SlotTypeMismatch {
            slot: slot.name().to_string(),
            expected: slot.model_name(),
            found,
        });
    }
    Ok(())
}

/// Builder for [`Presenter`], for adopting caller-supplied records
pub struct PresenterBuilder {
    definition: Rc<PresenterDefinition>,
    store: Store,
    /// `None` leaves the slot empty
    records: Vec<(String, Option<SharedRecord>)>,
    attributes: Option<Attributes>,
}

impl PresenterBuilder {
    /// Bind an existing record into `slot` instead of a fresh one
    pub fn record<R: Record + 'static>(mut self, slot: &str, record: Rc<RefCell<R>>) -> Self {
        self.records.push((slot.to_string(), Some(record as SharedRecord)));
        self
    }

    /// Leave `slot` without a record
    pub fn without(mut self, slot: &str) -> Self {
        self.records.push((slot.to_string(), None));
        self
    }

    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn build(self) -> PresenterResult<Presenter> {
        let definition = self.definition;
        let mut adopted: Vec<Option<Option<SharedRecord>>> = vec![None; definition.slots().len()];

        for (name, record) in self.records {
            let index = definition
                .slot_index(&name)
                .ok_or_else(|| PresenterError::UnknownSlot {
                    presenter: definition.name().to_string(),
                    slot: name.clone(),
                })?;
            if let Some(record) = &record {
                check_model(&definition, index, record)?;
            }
            adopted[index] = Some(record);
        }

        let slots = definition
            .slots()
            .iter()
            .zip(adopted)
            .map(|(slot, binding)| binding.unwrap_or_else(|| Some(slot.build_record())))
            .collect();

        let mut presenter = Presenter {
            own_values: vec![Value::Null; definition.own_attributes().len()],
            definition,
            store: self.store,
            slots,
            errors: Errors::new(),
            trace: Vec::new(),
        };
        presenter.assign_attributes(self.attributes)?;

        tracing::debug!(
            presenter = %presenter.definition.name(),
            slots = presenter.slots.len(),
            bound = presenter.bound_records().count(),
            "Presenter built"
        );
        Ok(presenter)
    }
}
