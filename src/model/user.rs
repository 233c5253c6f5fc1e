//! User Record
//!
//! Login credentials and profile fields collected at sign-up.

use chrono::{DateTime, Utc};

use crate::domain::{Errors, Value, ValueError};

use super::{assign, AttributeDef, Record, RecordState};

const ATTRIBUTES: &[AttributeDef] = &[
    AttributeDef::text("login"),
    AttributeDef::text("email"),
    AttributeDef::text("display_name"),
    AttributeDef::text("password"),
    AttributeDef::text("password_confirmation"),
    AttributeDef::timestamp("birthday"),
];

/// User Record
///
/// `login` and `password` are required; `password_confirmation`, when
/// given, must match `password`.
#[derive(Debug, Clone, Default)]
pub struct User {
    state: RecordState,
    login: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    password: Option<String>,
    password_confirmation: Option<String>,
    birthday: Option<DateTime<Utc>>,
}

impl User {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a user with credentials set
    pub fn with_credentials(login: impl Into<String>, password: impl Into<String>) -> Self {
        let password = password.into();
        Self {
            login: Some(login.into()),
            password_confirmation: Some(password.clone()),
            password: Some(password),
            ..Self::default()
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn birthday(&self) -> Option<DateTime<Utc>> {
        self.birthday
    }

    pub fn attribute_changed(&self, attribute: &str) -> bool {
        self.state.attribute_changed(attribute)
    }
}

impl Record for User {
    fn model_name(&self) -> &'static str {
        "User"
    }

    fn table_name(&self) -> &'static str {
        "users"
    }

    fn attribute_defs(&self) -> &'static [AttributeDef] {
        ATTRIBUTES
    }

    fn read_attribute(&self, name: &str) -> Option<Value> {
        let value = match name {
            "login" => self.login.clone().into(),
            "email" => self.email.clone().into(),
            "display_name" => self.display_name.clone().into(),
            "password" => self.password.clone().into(),
            "password_confirmation" => self.password_confirmation.clone().into(),
            "birthday" => self.birthday.into(),
            _ => return None,
        };
        Some(value)
    }

    fn write_attribute(&mut self, name: &str, value: Value) -> Result<(), ValueError> {
        let state = &mut self.state;
        match name {
            "login" => assign(state, name, &mut self.login, value, Value::into_text),
            "email" => assign(state, name, &mut self.email, value, Value::into_text),
            "display_name" => assign(state, name, &mut self.display_name, value, Value::into_text),
            "password" => assign(state, name, &mut self.password, value, Value::into_text),
            "password_confirmation" => {
                assign(state, name, &mut self.password_confirmation, value, Value::into_text)
            }
            "birthday" => assign(state, name, &mut self.birthday, value, Value::into_timestamp),
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
        let password: Value = self.password.clone().into();
        errors.validate_presence("login", &self.login.clone().into());
        errors.validate_presence("password", &password);
        errors.validate_confirmation(
            "password_confirmation",
            &password,
            &self.password_confirmation.clone().into(),
        );
    }
}
