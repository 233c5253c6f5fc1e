//! Presenter definitions
//!
//! A definition names the slots a presenter binds, its own attributes, the
//! hooks registered per lifecycle stage, and the message/label collaborators.
//! The routing table is computed once, when the definition is built.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::domain::{Catalog, Errors, HumanizedLabels, LabelLookup, MessageCatalog};
use crate::error::{PresenterError, PresenterResult};
use crate::model::{AttributeDef, Record, SharedRecord};

use super::routing::{Route, RoutingTable};
use super::Presenter;

/// Builds a fresh record for a slot
pub type RecordFactory = Rc<dyn Fn() -> SharedRecord>;

/// Lifecycle hook; returning [`Flow::Halt`] stops the chain
pub type Hook = Rc<dyn Fn(&mut Presenter) -> Flow>;

/// Presenter-level validation
pub type Validator = Rc<dyn Fn(&Presenter, &mut Errors)>;

/// Lifecycle stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    BeforeValidation,
    Validate,
    BeforeSave,
    Persist,
    AfterSave,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::BeforeValidation,
        Stage::Validate,
        Stage::BeforeSave,
        Stage::Persist,
        Stage::AfterSave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::BeforeValidation => "before_validation",
            Stage::Validate => "validate",
            Stage::BeforeSave => "before_save",
            Stage::Persist => "persist",
            Stage::AfterSave => "after_save",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hook result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// How a slot's attributes are exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingMode {
    /// `user_login` for slot `user`
    Prefixed,
    /// `login`, as if the presenter were the record
    Unprefixed,
}

/// Which registration keeps a virtual name claimed more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    #[default]
    FirstRegistered,
    LastRegistered,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first_registered" => Ok(Self::FirstRegistered),
            "last" | "last_registered" => Ok(Self::LastRegistered),
            other => Err(format!("unknown collision policy '{}'", other)),
        }
    }
}

/// One slot of a presenter definition
pub struct SlotDef {
    name: String,
    mode: NamingMode,
    model_name: &'static str,
    attributes: &'static [AttributeDef],
    factory: RecordFactory,
}

impl SlotDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> NamingMode {
        self.mode
    }

    pub fn model_name(&self) -> &'static str {
        self.model_name
    }

    pub fn attributes(&self) -> &'static [AttributeDef] {
        self.attributes
    }

    /// Name the presenter exposes for one of this slot's attributes
    pub fn virtual_name(&self, local: &str) -> String {
        match self.mode {
            NamingMode::Prefixed => format!("{}_{}", self.name, local),
            NamingMode::Unprefixed => local.to_string(),
        }
    }

    pub fn build_record(&self) -> SharedRecord {
        (self.factory)()
    }
}

impl fmt::Debug for SlotDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotDef")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("model_name", &self.model_name)
            .finish()
    }
}

/// Registration order across slots and own attributes
#[derive(Debug, Clone, Copy)]
pub(crate) enum Entry {
    Slot(usize),
    Own(usize),
}

/// Immutable presenter type description
pub struct PresenterDefinition {
    name: String,
    slots: Vec<SlotDef>,
    own_attributes: Vec<String>,
    routes: RoutingTable,
    hooks: HashMap<Stage, Vec<Hook>>,
    validators: Vec<Validator>,
    catalog: Rc<dyn MessageCatalog>,
    labels: Rc<dyn LabelLookup>,
}

impl PresenterDefinition {
    pub fn builder(name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &[SlotDef] {
        &self.slots
    }

    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    pub fn own_attributes(&self) -> &[String] {
        &self.own_attributes
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn hooks(&self, stage: Stage) -> &[Hook] {
        self.hooks.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn catalog(&self) -> &dyn MessageCatalog {
        self.catalog.as_ref()
    }

    /// Display label for a virtual attribute, taken from the owning slot's
    /// local name (`user_login` -> `Login`)
    pub fn human_attribute_name(&self, attribute: &str) -> String {
        match self.routes.get(attribute) {
            Some(Route::Slot { local, .. }) => self.labels.label_for(local),
            _ => self.labels.label_for(attribute),
        }
    }

    /// Label prefixed to full error messages: the whole virtual name, so
    /// `user_login` renders as `User login`
    pub fn message_label(&self, attribute: &str) -> String {
        self.labels.label_for(attribute)
    }
}

impl fmt::Debug for PresenterDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenterDefinition")
            .field("name", &self.name)
            .field("slots", &self.slots)
            .field("own_attributes", &self.own_attributes)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PresenterDefinition`]
pub struct DefinitionBuilder {
    name: String,
    slots: Vec<SlotDef>,
    own_attributes: Vec<String>,
    order: Vec<Entry>,
    hooks: HashMap<Stage, Vec<Hook>>,
    validators: Vec<Validator>,
    collision_policy: CollisionPolicy,
    catalog: Rc<dyn MessageCatalog>,
    labels: Rc<dyn LabelLookup>,
}

impl DefinitionBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
            own_attributes: Vec::new(),
            order: Vec::new(),
            hooks: HashMap::new(),
            validators: Vec::new(),
            collision_policy: CollisionPolicy::default(),
            catalog: Rc::new(Catalog::english()),
            labels: Rc::new(HumanizedLabels::new()),
        }
    }

    /// Bind a slot whose attributes are exposed as `<slot>_<attribute>`
    pub fn presents<R, F>(self, name: &str, factory: F) -> Self
    where
        R: Record + 'static,
        F: Fn() -> R + 'static,
    {
        self.slot(name, NamingMode::Prefixed, factory)
    }

    /// Bind a slot whose attributes are exposed under their own names
    pub fn decorates<R, F>(self, name: &str, factory: F) -> Self
    where
        R: Record + 'static,
        F: Fn() -> R + 'static,
    {
        self.slot(name, NamingMode::Unprefixed, factory)
    }

    pub fn slot<R, F>(mut self, name: &str, mode: NamingMode, factory: F) -> Self
    where
        R: Record + 'static,
        F: Fn() -> R + 'static,
    {
        let prototype = factory();
        let factory: RecordFactory = Rc::new(move || -> SharedRecord { Rc::new(RefCell::new(factory())) });

        self.order.push(Entry::Slot(self.slots.len()));
        self.slots.push(SlotDef {
            name: name.to_string(),
            mode,
            model_name: prototype.model_name(),
            attributes: prototype.attribute_defs(),
            factory,
        });
        self
    }

    /// Declare an attribute held by the presenter itself
    pub fn attribute(mut self, name: &str) -> Self {
        self.order.push(Entry::Own(self.own_attributes.len()));
        self.own_attributes.push(name.to_string());
        self
    }

    pub fn validate<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Presenter, &mut Errors) + 'static,
    {
        self.validators.push(Rc::new(validator));
        self
    }

    pub fn before_validation<F>(self, hook: F) -> Self
    where
        F: Fn(&mut Presenter) -> Flow + 'static,
    {
        self.hook(Stage::BeforeValidation, hook)
    }

    pub fn before_save<F>(self, hook: F) -> Self
    where
        F: Fn(&mut Presenter) -> Flow + 'static,
    {
        self.hook(Stage::BeforeSave, hook)
    }

    pub fn after_save<F>(self, hook: F) -> Self
    where
        F: Fn(&mut Presenter) -> Flow + 'static,
    {
        self.hook(Stage::AfterSave, hook)
    }

    /// Register a hook; only the `before_validation`, `before_save` and
    /// `after_save` stages run hooks
    pub fn hook<F>(mut self, stage: Stage, hook: F) -> Self
    where
        F: Fn(&mut Presenter) -> Flow + 'static,
    {
        self.hooks.entry(stage).or_default().push(Rc::new(hook));
        self
    }

    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    pub fn catalog(mut self, catalog: Rc<dyn MessageCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn labels(mut self, labels: Rc<dyn LabelLookup>) -> Self {
        self.labels = labels;
        self
    }

    pub fn build(self) -> PresenterResult<Rc<PresenterDefinition>> {
        for (index, slot) in self.slots.iter().enumerate() {
            if self.slots[..index].iter().any(|other| other.name == slot.name) {
                return Err(PresenterError::DuplicateSlot {
                    presenter: self.name,
                    slot: slot.name.clone(),
                });
            }
        }

        let routes = RoutingTable::build(
            &self.slots,
            &self.own_attributes,
            &self.order,
            self.collision_policy,
        );
        for collision in routes.collisions() {
            tracing::warn!(
                presenter = %self.name,
                attribute = %collision.name,
                kept = %collision.kept,
                shadowed = %collision.shadowed,
                "Virtual attribute claimed by more than one slot"
            );
        }

        Ok(Rc::new(PresenterDefinition {
            name: self.name,
            slots: self.slots,
            own_attributes: self.own_attributes,
            routes,
            hooks: self.hooks,
            validators: self.validators,
            catalog: self.catalog,
            labels: self.labels,
        }))
    }
}
