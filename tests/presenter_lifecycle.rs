//! Integration tests for the save lifecycle, decorators and transactions

use signup_presenter::domain::{keys, Locale, Value, BASE};
use signup_presenter::model::{shared, Record};
use signup_presenter::presenter::{PersistFailure, SaveOutcome, Stage};
use signup_presenter::{Presenter, PresenterError, Store};

mod common;

use common::{attrs, hash_for_user, valid_user};

const FULL_CHAIN: [Stage; 3] = [Stage::BeforeValidation, Stage::BeforeSave, Stage::AfterSave];

fn build(definition: std::rc::Rc<signup_presenter::PresenterDefinition>) -> Presenter {
    Presenter::new(definition, Store::new(), None).unwrap()
}

// =========================================================================
// Callbacks
// =========================================================================

#[test]
fn test_after_save_runs_for_both_entry_points() {
    let mut saved = build(common::after_save());
    assert!(saved.save());
    assert_eq!(saved.read("address_street").unwrap(), Value::from("Some Street"));

    let mut strict = build(common::after_save());
    strict.save_strict().unwrap();
    assert_eq!(strict.read("address_street").unwrap(), Value::from("Some Street"));
}

#[test]
fn test_callback_cant_save_raises_record_not_saved() {
    let mut presenter = build(common::callback_cant_save());

    assert!(!presenter.save());
    assert!(matches!(
        presenter.save_strict(),
        Err(PresenterError::RecordNotSaved { .. })
    ));
    assert_eq!(presenter.store().stats().begun, 0);
}

#[test]
fn test_callback_cant_validate_raises_record_invalid() {
    let mut presenter = build(common::callback_cant_validate());

    assert!(matches!(
        presenter.save_strict(),
        Err(PresenterError::RecordInvalid { .. })
    ));
}

#[test]
fn test_callback_cant_validate_trace_for_save() {
    let mut presenter = build(common::callback_cant_validate());

    assert_eq!(presenter.attempt_save(), SaveOutcome::ValidationHalted);
    assert_eq!(presenter.trace(), &[Stage::BeforeValidation]);
}

#[test]
fn test_callback_cant_validate_trace_for_save_strict() {
    let mut presenter = build(common::callback_cant_validate());

    assert!(presenter.save_strict().is_err());
    assert_eq!(presenter.trace(), &[Stage::BeforeValidation]);
}

#[test]
fn test_errors_cleared_before_validation() {
    let mut presenter = build(common::callback_cant_validate());
    presenter.errors_mut().add("account_title", keys::INVALID);

    assert!(!presenter.valid());
    assert!(presenter.errors().is_empty());
}

#[test]
fn test_callback_ordering() {
    let mut presenter = build(common::callback_ordering());

    presenter.save_strict().unwrap();
    assert_eq!(presenter.trace(), &FULL_CHAIN);

    assert!(presenter.save());
    assert_eq!(presenter.trace(), &[FULL_CHAIN, FULL_CHAIN].concat()[..]);

    presenter.save_strict().unwrap();
    assert_eq!(presenter.trace(), &[FULL_CHAIN, FULL_CHAIN, FULL_CHAIN].concat()[..]);

    presenter.reset_trace();
    assert!(presenter.trace().is_empty());
}

#[test]
fn test_hook_added_errors_survive_validation() {
    let definition = signup_presenter::PresenterDefinition::builder("ClosedSignup")
        .presents("account", signup_presenter::model::Account::new)
        .before_validation(|presenter| {
            presenter.errors_mut().add_message(BASE, "Signups are closed");
            signup_presenter::Flow::Continue
        })
        .build()
        .unwrap();
    let mut presenter = build(definition);

    assert_eq!(presenter.attempt_save(), SaveOutcome::Invalid);
    assert_eq!(
        presenter.full_messages(&Locale::english()),
        vec!["Signups are closed"]
    );
}

// =========================================================================
// Optional slots
// =========================================================================

#[test]
fn test_signup_without_account() {
    let store = Store::new();
    let mut presenter = Presenter::builder(common::signup(), store.clone())
        .record("user", shared(valid_user()))
        .without("account")
        .build()
        .unwrap();

    assert!(presenter.save());
    assert_eq!(store.count("users"), 1);
    assert_eq!(store.count("accounts"), 0);
    assert!(!presenter.new_record());
    assert_eq!(presenter.id(), presenter.record("user").unwrap().borrow().id());
}

#[test]
fn test_signup_without_account_save_strict() {
    let store = Store::new();
    let mut presenter = Presenter::builder(common::signup(), store.clone())
        .record("user", shared(valid_user()))
        .without("account")
        .build()
        .unwrap();

    assert!(presenter.save_strict().is_ok());
    assert_eq!(store.count("accounts"), 0);
    assert_eq!(store.stats().committed, 1);
}

#[test]
fn test_signup_without_account_still_validates_user() {
    let mut presenter = Presenter::builder(common::signup(), Store::new())
        .without("account")
        .build()
        .unwrap();

    assert!(!presenter.save());
    assert_eq!(
        presenter.full_messages(&Locale::english()),
        vec!["User login can't be blank", "User password can't be blank"]
    );
    assert_eq!(presenter.store().stats().begun, 0);
}

#[test]
fn test_account_cleared_after_build() {
    let store = Store::new();
    let mut presenter = Presenter::new(
        common::signup(),
        store.clone(),
        Some(attrs(&[("user_login", "da"), ("user_password", "seekrit")])),
    )
    .unwrap();

    presenter.clear_record("account").unwrap();

    assert!(presenter.save());
    assert_eq!(store.count("users"), 1);
    assert_eq!(store.count("accounts"), 0);
}

// =========================================================================
// Decorator mode
// =========================================================================

#[test]
fn test_decorated_user_is_not_valid() {
    let mut presenter = build(common::decorated_user());

    assert!(!presenter.valid());
    assert_eq!(
        presenter.record("user").unwrap().borrow().model_name(),
        "User"
    );
}

#[test]
fn test_decorated_user_routes_unprefixed() {
    let mut presenter = build(common::decorated_user());

    presenter.write("login", "mymockvalue").unwrap();

    assert_eq!(presenter.read("login").unwrap(), Value::from("mymockvalue"));
    assert!(!presenter.responds_to("user_login"));
}

#[test]
fn test_decorated_user_error_messages() {
    let mut presenter = build(common::decorated_user());
    presenter.valid();
    assert_eq!(
        presenter.messages_for("login", &Locale::english()),
        vec!["can't be blank"]
    );

    let mut presenter = Presenter::new(
        common::decorated_user(),
        Store::new(),
        Some(attrs(&[("password", "foo"), ("password_confirmation", "foo")])),
    )
    .unwrap();
    presenter.valid();
    assert_eq!(
        presenter.full_messages(&Locale::english()),
        vec!["Login can't be blank"]
    );
}

#[test]
fn test_decorated_user_save() {
    let mut presenter = build(common::decorated_user());
    assert!(!presenter.save());
    assert!(matches!(
        presenter.save_strict(),
        Err(PresenterError::RecordInvalid { .. })
    ));

    let mut presenter = Presenter::new(
        common::decorated_user(),
        Store::new(),
        Some(attrs(&[("login", "da"), ("password", "seekrit")])),
    )
    .unwrap();
    assert!(presenter.save_strict().is_ok());
    assert_eq!(presenter.store().stats().committed, 1);
}

#[test]
fn test_decorated_user_with_tags() {
    let mut presenter = Presenter::builder(common::decorated_user_with_tags(), Store::new())
        .record("user", shared(valid_user()))
        .build()
        .unwrap();

    assert!(!presenter.valid());
    assert_eq!(
        presenter.messages_for("tags", &Locale::english()),
        vec!["can't be blank"]
    );

    presenter.write("tags", "Tall, Mammal").unwrap();
    assert!(presenter.valid());
}

#[test]
fn test_decorated_user_with_tags_from_attributes() {
    let mut attributes = hash_for_user();
    attributes.insert("tags".to_string(), Value::from("Tall, Mammal"));

    let mut presenter =
        Presenter::new(common::decorated_user_with_tags(), Store::new(), Some(attributes)).unwrap();

    assert!(presenter.valid());
    assert_eq!(presenter.read("tags").unwrap(), Value::from("Tall, Mammal"));
}

#[test]
fn test_unprefixed_collision_is_explicit() {
    let definition = signup_presenter::PresenterDefinition::builder("DoubleUser")
        .decorates("primary", signup_presenter::model::User::new)
        .decorates("secondary", signup_presenter::model::User::new)
        .build()
        .unwrap();
    let mut presenter = build(definition);

    presenter.write("login", "alice").unwrap();

    let primary = presenter.record("primary").unwrap();
    let secondary = presenter.record("secondary").unwrap();
    assert_eq!(primary.borrow().read_attribute("login"), Some(Value::from("alice")));
    assert_eq!(secondary.borrow().read_attribute("login"), Some(Value::Null));
}

// =========================================================================
// Transactions
// =========================================================================

#[test]
fn test_rollback_when_one_slot_refuses() {
    let store = Store::new();
    let mut presenter = Presenter::new(
        common::refusing_signup(),
        store.clone(),
        Some(attrs(&[("user_login", "da"), ("user_password", "seekrit")])),
    )
    .unwrap();

    assert_eq!(
        presenter.attempt_save(),
        SaveOutcome::PersistFailed(PersistFailure::Rejected)
    );
    assert_eq!(store.count("users"), 0);
    assert_eq!(store.count("accounts"), 0);
    assert_eq!(store.count("refusals"), 0);
    assert!(presenter.new_record());
    assert_eq!(presenter.id(), None);
    assert_eq!(presenter.errors().keys_for(BASE), vec![keys::NOT_SAVED]);

    let stats = store.stats();
    assert_eq!(stats.begun, 1);
    assert_eq!(stats.rolled_back, 1);
    assert_eq!(stats.committed, 0);
}

#[test]
fn test_rollback_raises_record_not_saved() {
    let mut presenter = Presenter::new(
        common::refusing_signup(),
        Store::new(),
        Some(attrs(&[("user_login", "da"), ("user_password", "seekrit")])),
    )
    .unwrap();

    let err = presenter.save_strict().unwrap_err();
    assert!(matches!(err, PresenterError::RecordNotSaved { .. }));
    assert!(!err.is_programmer_error());
}

#[test]
fn test_taken_login_rolls_back_everything() {
    let store = Store::new().unique("users", "login");
    let credentials = attrs(&[("user_login", "da"), ("user_password", "seekrit")]);

    let mut first = Presenter::new(common::signup(), store.clone(), Some(credentials.clone())).unwrap();
    assert!(first.save());

    let mut second = Presenter::new(common::signup(), store.clone(), Some(credentials)).unwrap();
    let err = second.save_strict().unwrap_err();

    assert!(matches!(err, PresenterError::RecordNotSaved { .. }));
    assert_eq!(
        second.full_messages(&Locale::english()),
        vec!["User login has already been taken"]
    );
    assert_eq!(store.count("users"), 1);
    assert_eq!(store.count("accounts"), 1);
    assert!(second.new_record());
}

#[test]
fn test_failed_save_can_be_retried() {
    let store = Store::new().unique("users", "login");
    let mut first = Presenter::new(
        common::signup(),
        store.clone(),
        Some(attrs(&[("user_login", "da"), ("user_password", "seekrit")])),
    )
    .unwrap();
    assert!(first.save());

    let mut second = Presenter::new(
        common::signup(),
        store.clone(),
        Some(attrs(&[("user_login", "da"), ("user_password", "other")])),
    )
    .unwrap();
    assert!(!second.save());

    second.write("user_login", "db").unwrap();
    assert!(second.save());
    assert!(second.errors().is_empty());
    assert_eq!(store.count("users"), 2);
    assert_eq!(store.count("accounts"), 2);
}
