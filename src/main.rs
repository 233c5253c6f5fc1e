//! signup_presenter - sign-up demo
//!
//! Reads a JSON attribute mapping (first argument, or stdin), binds it to a
//! user + account sign-up presenter over an in-memory store, saves it, and
//! prints either the new record ids or the full error messages.
//!
//! ```text
//! signup_presenter '{"user_login": "alice", "user_password": "secret"}'
//! ```

use std::io::Read;
use std::rc::Rc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signup_presenter::domain::{Attributes, MessageCatalog};
use signup_presenter::model::{Account, User};
use signup_presenter::{Config, Presenter, PresenterDefinition, SaveOutcome, Store};

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signup_presenter=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build the sign-up presenter definition
fn signup_definition(config: &Config) -> anyhow::Result<Rc<PresenterDefinition>> {
    let catalog: Rc<dyn MessageCatalog> = Rc::new(config.catalog()?);
    let definition = PresenterDefinition::builder("SignupPresenter")
        .presents("user", User::new)
        .presents("account", Account::new)
        .collision_policy(config.collision_policy)
        .catalog(catalog)
        .build()?;
    Ok(definition)
}

/// Attribute mapping from the first argument, or stdin when absent
fn read_input() -> anyhow::Result<Attributes> {
    let raw = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read attributes from stdin")?;
            buffer
        }
    };

    if raw.trim().is_empty() {
        return Ok(Attributes::new());
    }
    serde_json::from_str(&raw).context("Attributes must be a JSON object of scalars")
}

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;
    tracing::info!(locale = %config.locale, policy = ?config.collision_policy, "Starting sign-up demo");

    let definition = signup_definition(&config)?;
    let store = Store::new().unique("users", "login");
    let attributes = read_input()?;

    let mut presenter = Presenter::new(definition, store.clone(), Some(attributes))?;

    match presenter.attempt_save() {
        SaveOutcome::Saved => {
            let user = presenter.record("user")?;
            let account = presenter.record("account")?;
            let output = serde_json::json!({
                "saved": true,
                "user_id": user.borrow().id(),
                "account_id": account.borrow().id(),
                "attributes": presenter.attributes(),
                "transactions": store.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        outcome => {
            tracing::warn!(?outcome, "Sign-up not saved");
            let output = serde_json::json!({
                "saved": false,
                "errors": presenter.full_messages(&config.locale),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            std::process::exit(1);
        }
    }

    Ok(())
}
