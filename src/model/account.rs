//! Account Record
//!
//! The wallet account opened alongside a user at sign-up.

use crate::domain::{Errors, Value, ValueError};

use super::{assign, AttributeDef, Record, RecordState};

const ATTRIBUTES: &[AttributeDef] = &[
    AttributeDef::text("title"),
    AttributeDef::text("account_type"),
];

/// Default account type for new accounts
pub const USER_WALLET: &str = "user_wallet";

/// Account Record
#[derive(Debug, Clone)]
pub struct Account {
    state: RecordState,
    title: Option<String>,
    account_type: Option<String>,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            state: RecordState::new(),
            title: None,
            account_type: Some(USER_WALLET.to_string()),
        }
    }
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn account_type(&self) -> Option<&str> {
        self.account_type.as_deref()
    }
}

impl Record for Account {
    fn model_name(&self) -> &'static str {
        "Account"
    }

    fn table_name(&self) -> &'static str {
        "accounts"
    }

    fn attribute_defs(&self) -> &'static [AttributeDef] {
        ATTRIBUTES
    }

    fn read_attribute(&self, name: &str) -> Option<Value> {
        match name {
            "title" => Some(self.title.clone().into()),
            "account_type" => Some(self.account_type.clone().into()),
            _ => None,
        }
    }

    fn write_attribute(&mut self, name: &str, value: Value) -> Result<(), ValueError> {
        let state = &mut self.state;
        match name {
            "title" => assign(state, name, &mut self.title, value, Value::into_text),
            "account_type" => assign(state, name, &mut self.account_type, value, Value::into_text),
            _ => Err(ValueError::UnknownAttribute(name.to_string())),
        }
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn check(&self, errors: &mut Errors) {
        errors.validate_presence("account_type", &self.account_type.clone().into());
    }
}
