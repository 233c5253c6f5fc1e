//! Common test utilities
//!
//! Extra records and the presenter definitions shared by the integration
//! tests.

#![allow(dead_code)]

use std::rc::Rc;

use signup_presenter::domain::{keys, Attributes, Catalog, Errors, Locale, Value, ValueError};
use signup_presenter::model::{assign, persist_record, Account, AttributeDef, Record, RecordState, User};
use signup_presenter::presenter::{Flow, PresenterDefinition};
use signup_presenter::store::{StoreResult, Transaction};

// =========================================================================
// Records
// =========================================================================

const ADDRESS_ATTRIBUTES: &[AttributeDef] = &[AttributeDef::text("street"), AttributeDef::text("city")];

#[derive(Debug, Clone, Default)]
pub struct Address {
    state: RecordState,
    street: Option<String>,
    city: Option<String>,
}

impl Address {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Record for Address {
    fn model_name(&self) -> &'static str {
        "Address"
    }

    fn table_name(&self) -> &'static str {
        "addresses"
    }

    fn attribute_defs(&self) -> &'static [AttributeDef] {
        ADDRESS_ATTRIBUTES
    }

    fn read_attribute(&self, name: &str) -> Option<Value> {
        match name {
            "street" => Some(self.street.clone().into()),
            "city" => Some(self.city.clone().into()),
            _ => None,
        }
    }

    fn write_attribute(&mut self, name: &str, value: Value) -> Result<(), ValueError> {
        let state = &mut self.state;
        match name {
            "street" => assign(state, name, &mut self.street, value, Value::into_text),
            "city" => assign(state, name, &mut self.city, value, Value::into_text),
            _ => Err(ValueError::UnknownAttribute(name.to_string())),
        }
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn check(&self, _errors: &mut Errors) {}
}

const ACCOUNT_INFO_ATTRIBUTES: &[AttributeDef] = &[AttributeDef::text("info")];

#[derive(Debug, Clone, Default)]
pub struct AccountInfo {
    state: RecordState,
    info: Option<String>,
}

impl AccountInfo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Record for AccountInfo {
    fn model_name(&self) -> &'static str {
        "AccountInfo"
    }

    fn table_name(&self) -> &'static str {
        "account_infos"
    }

    fn attribute_defs(&self) -> &'static [AttributeDef] {
        ACCOUNT_INFO_ATTRIBUTES
    }

    fn read_attribute(&self, name: &str) -> Option<Value> {
        match name {
            "info" => Some(self.info.clone().into()),
            _ => None,
        }
    }

    fn write_attribute(&mut self, name: &str, value: Value) -> Result<(), ValueError> {
        match name {
            "info" => assign(&mut self.state, name, &mut self.info, value, Value::into_text),
            _ => Err(ValueError::UnknownAttribute(name.to_string())),
        }
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn check(&self, _errors: &mut Errors) {}
}

const HISTORY_ATTRIBUTES: &[AttributeDef] = &[AttributeDef::text("comment")];

#[derive(Debug, Clone, Default)]
pub struct History {
    state: RecordState,
    comment: Option<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Record for History {
    fn model_name(&self) -> &'static str {
        "History"
    }

    fn table_name(&self) -> &'static str {
        "histories"
    }

    fn attribute_defs(&self) -> &'static [AttributeDef] {
        HISTORY_ATTRIBUTES
    }

    fn read_attribute(&self, name: &str) -> Option<Value> {
        match name {
            "comment" => Some(self.comment.clone().into()),
            _ => None,
        }
    }

    fn write_attribute(&mut self, name: &str, value: Value) -> Result<(), ValueError> {
        match name {
            "comment" => assign(&mut self.state, name, &mut self.comment, value, Value::into_text),
            _ => Err(ValueError::UnknownAttribute(name.to_string())),
        }
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn check(&self, _errors: &mut Errors) {}
}

/// Valid record whose save stages its row and then reports failure
#[derive(Debug, Clone, Default)]
pub struct Refusing {
    state: RecordState,
}

impl Refusing {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Record for Refusing {
    fn model_name(&self) -> &'static str {
        "Refusing"
    }

    fn table_name(&self) -> &'static str {
        "refusals"
    }

    fn attribute_defs(&self) -> &'static [AttributeDef] {
        &[]
    }

    fn read_attribute(&self, _name: &str) -> Option<Value> {
        None
    }

    fn write_attribute(&mut self, name: &str, _value: Value) -> Result<(), ValueError> {
        Err(ValueError::UnknownAttribute(name.to_string()))
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn check(&self, _errors: &mut Errors) {}

    fn save(&mut self, tx: &mut Transaction) -> StoreResult<bool> {
        persist_record(self, tx)?;
        Ok(false)
    }
}

// =========================================================================
// Locale
// =========================================================================

pub const LEET_BLANK: &str = "c4N n07 83 8L4nK";

pub fn leet() -> Locale {
    Locale::new("1337")
}

/// English catalog plus the `1337` locale
pub fn catalog() -> Rc<Catalog> {
    Rc::new(Catalog::english().with_message(&leet(), keys::BLANK, LEET_BLANK))
}

// =========================================================================
// Definitions
// =========================================================================

pub fn signup() -> Rc<PresenterDefinition> {
    PresenterDefinition::builder("SignupPresenter")
        .presents("user", User::new)
        .presents("account", Account::new)
        .catalog(catalog())
        .build()
        .unwrap()
}

pub fn decorated_user() -> Rc<PresenterDefinition> {
    PresenterDefinition::builder("DecoratedUser")
        .decorates("user", User::new)
        .build()
        .unwrap()
}

pub fn decorated_user_with_tags() -> Rc<PresenterDefinition> {
    PresenterDefinition::builder("DecoratedUserWithTags")
        .decorates("user", User::new)
        .attribute("tags")
        .validate(|presenter, errors| {
            if !presenter.query("tags").unwrap_or(false) {
                errors.add("tags", keys::BLANK);
            }
        })
        .build()
        .unwrap()
}

pub fn callback_ordering() -> Rc<PresenterDefinition> {
    PresenterDefinition::builder("CallbackOrderingPresenter")
        .presents("account", Account::new)
        .before_validation(|_| Flow::Continue)
        .before_save(|_| Flow::Continue)
        .after_save(|_| Flow::Continue)
        .build()
        .unwrap()
}

pub fn callback_cant_validate() -> Rc<PresenterDefinition> {
    PresenterDefinition::builder("CallbackCantValidatePresenter")
        .presents("account", Account::new)
        .before_validation(|_| Flow::Halt)
        .before_save(|_| Flow::Continue)
        .after_save(|_| Flow::Continue)
        .build()
        .unwrap()
}

pub fn callback_cant_save() -> Rc<PresenterDefinition> {
    PresenterDefinition::builder("CallbackCantSavePresenter")
        .presents("account", Account::new)
        .before_validation(|_| Flow::Continue)
        .before_save(|_| Flow::Halt)
        .after_save(|_| Flow::Continue)
        .build()
        .unwrap()
}

pub fn after_save() -> Rc<PresenterDefinition> {
    PresenterDefinition::builder("AfterSavePresenter")
        .presents("address", Address::new)
        .after_save(|presenter| match presenter.write("address_street", "Some Street") {
            Ok(()) => Flow::Continue,
            Err(_) => Flow::Halt,
        })
        .build()
        .unwrap()
}

pub fn two_addresses() -> Rc<PresenterDefinition> {
    PresenterDefinition::builder("PresenterWithTwoAddresses")
        .presents("address", Address::new)
        .presents("secondary_address", Address::new)
        .build()
        .unwrap()
}

pub fn same_prefix() -> Rc<PresenterDefinition> {
    PresenterDefinition::builder("SamePrefixPresenter")
        .presents("account", Account::new)
        .presents("account_info", AccountInfo::new)
        .build()
        .unwrap()
}

pub fn historical() -> Rc<PresenterDefinition> {
    PresenterDefinition::builder("HistoricalPresenter")
        .presents("user", User::new)
        .presents("history", History::new)
        .build()
        .unwrap()
}

pub fn refusing_signup() -> Rc<PresenterDefinition> {
    PresenterDefinition::builder("RefusingSignupPresenter")
        .presents("user", User::new)
        .presents("account", Account::new)
        .presents("refusal", Refusing::new)
        .build()
        .unwrap()
}

// =========================================================================
// Attribute helpers
// =========================================================================

pub fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), Value::from(*value)))
        .collect()
}

/// Local attributes of a valid user
pub fn hash_for_user() -> Attributes {
    attrs(&[
        ("login", "jane"),
        ("password", "seekrit"),
        ("password_confirmation", "seekrit"),
    ])
}

/// A valid, unsaved user
pub fn valid_user() -> User {
    let mut user = User::new();
    for (name, value) in hash_for_user() {
        user.write_attribute(&name, value).unwrap();
    }
    user
}
