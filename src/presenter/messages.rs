//! Error messages
//!
//! Renders the presenter's error set. Labels come from the definition's
//! label lookup and message text from its catalog, resolved against the
//! locale passed to each call.

use crate::domain::{ErrorEntry, Errors, Locale};

use super::Presenter;

impl Presenter {
    /// Error set from the last validation pass
    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Mutable error set, for hooks that report their own failures
    pub fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }

    /// Display label for a virtual attribute, as the owning record names it
    pub fn human_attribute_name(&self, attribute: &str) -> String {
        self.definition.human_attribute_name(attribute)
    }

    /// Messages reported against `attribute`
    pub fn messages_for(&self, attribute: &str, locale: &Locale) -> Vec<String> {
        self.errors
            .on(attribute)
            .into_iter()
            .map(|entry| self.message_text(entry, locale))
            .collect()
    }

    /// `"<label> <message>"` for every error, in stored order; `base` errors
    /// render the message alone
    pub fn full_messages(&self, locale: &Locale) -> Vec<String> {
        self.errors
            .iter()
            .map(|entry| {
                let message = self.message_text(entry, locale);
                if entry.is_base() {
                    message
                } else {
                    format!("{} {}", self.definition.message_label(&entry.attribute), message)
                }
            })
            .collect()
    }

    fn message_text(&self, entry: &ErrorEntry, locale: &Locale) -> String {
        if let Some(message) = &entry.message {
            return message.clone();
        }
        self.definition
            .catalog()
            .message_for(&entry.key, locale)
            .unwrap_or_else(|| entry.key.replace('_', " "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{keys, Catalog, HumanizedLabels, BASE};
    use crate::model::User;
    use crate::presenter::PresenterDefinition;
    use crate::store::Store;
    use std::rc::Rc;

    fn leet() -> Locale {
        Locale::new("1337")
    }

    fn presenter() -> Presenter {
        let catalog = Catalog::english().with_message(&leet(), keys::BLANK, "c4N n07 83 8L4nK");
        let definition = PresenterDefinition::builder("SignupPresenter")
            .presents("user", User::new)
            .catalog(Rc::new(catalog))
            .labels(Rc::new(HumanizedLabels::new().with_label("user_password", "Password")))
            .build()
            .unwrap();
        Presenter::new(definition, Store::new(), None).unwrap()
    }

    #[test]
    fn test_full_messages_in_declared_order() {
        let mut presenter = presenter();
        assert!(!presenter.valid());

        assert_eq!(
            presenter.full_messages(&Locale::english()),
            vec!["User login can't be blank", "Password can't be blank"]
        );
    }

    #[test]
    fn test_locale_changes_text_only() {
        let mut presenter = presenter();
        assert!(!presenter.valid());
        let english = presenter.messages_for("user_login", &Locale::english());
        let flagged = presenter.errors().attributes().len();

        assert!(!presenter.valid());
        assert_eq!(presenter.messages_for("user_login", &leet()), vec!["c4N n07 83 8L4nK"]);
        assert_eq!(english, vec!["can't be blank"]);
        assert_eq!(presenter.errors().attributes().len(), flagged);
    }

    #[test]
    fn test_missing_locale_falls_back_to_english() {
        let mut presenter = presenter();
        presenter.write("user_password", "secret").unwrap();
        presenter.write("user_password_confirmation", "other").unwrap();
        assert!(!presenter.valid());

        assert_eq!(
            presenter.messages_for("user_password_confirmation", &leet()),
            vec!["doesn't match confirmation"]
        );
    }

    #[test]
    fn test_base_messages_have_no_label() {
        let mut presenter = presenter();
        presenter.errors_mut().add_message(BASE, "Signups are closed");

        assert_eq!(presenter.full_messages(&Locale::english()), vec!["Signups are closed"]);
    }
}
