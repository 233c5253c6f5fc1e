//! Lifecycle controller
//!
//! Drives `before_validation → validate → before_save → persist → after_save`.
//! Hooks halt the chain by returning [`Flow::Halt`]; validation and persist
//! failures are reported through [`SaveOutcome`] and the error set.

use std::rc::Rc;

use crate::domain::{keys, Errors, BASE};
use crate::error::{PresenterError, PresenterResult};
use crate::store::StoreError;

use super::persister::{self, PersistFailure, PersistOutcome};
use super::{Flow, Presenter, Stage};

/// How a save attempt ended
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved,
    /// A `before_validation` hook halted
    ValidationHalted,
    /// Validation produced errors
    Invalid,
    /// A `before_save` hook halted
    SaveHalted,
    /// The transaction rolled back
    PersistFailed(PersistFailure),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }

    /// Failures that happen before anything is persisted
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, SaveOutcome::ValidationHalted | SaveOutcome::Invalid)
    }
}

impl Presenter {
    /// Run `before_validation` and `validate`
    pub fn valid(&mut self) -> bool {
        self.run_validation().is_ok()
    }

    /// Run the full chain and report exactly where it stopped
    pub fn attempt_save(&mut self) -> SaveOutcome {
        if let Err(outcome) = self.run_validation() {
            tracing::debug!(
                presenter = %self.definition.name(),
                ?outcome,
                errors = self.errors.len(),
                "Save stopped before persisting"
            );
            return outcome;
        }

        if self.run_hooks(Stage::BeforeSave) == Flow::Halt {
            return SaveOutcome::SaveHalted;
        }

        tracing::debug!(presenter = %self.definition.name(), stage = %Stage::Persist, "Running stage");
        if let PersistOutcome::RolledBack { slot, failure } =
            persister::persist_all(&self.store, &self.slots)
        {
            self.record_persist_failure(slot, &failure);
            return SaveOutcome::PersistFailed(failure);
        }

        // A halt here only skips the remaining after_save hooks
        self.run_hooks(Stage::AfterSave);
        SaveOutcome::Saved
    }

    /// Non-raising save
    pub fn save(&mut self) -> bool {
        self.attempt_save().is_saved()
    }

    /// Raising save: `RecordInvalid` for failures before persisting,
    /// `RecordNotSaved` for halts and failures after validation passed
    pub fn save_strict(&mut self) -> PresenterResult<()> {
        match self.attempt_save() {
            SaveOutcome::Saved => Ok(()),
            SaveOutcome::ValidationHalted | SaveOutcome::Invalid => Err(PresenterError::RecordInvalid {
                errors: self.errors.clone(),
            }),
            SaveOutcome::SaveHalted => Err(PresenterError::RecordNotSaved {
                reason: "a before_save hook halted the chain".to_string(),
                errors: self.errors.clone(),
            }),
            SaveOutcome::PersistFailed(failure) => Err(PresenterError::RecordNotSaved {
                reason: match failure {
                    PersistFailure::Rejected => "a record refused to save".to_string(),
                    PersistFailure::Store(e) => e.to_string(),
                },
                errors: self.errors.clone(),
            }),
        }
    }

    /// Stages whose hooks have run, one entry per hook
    pub fn trace(&self) -> &[Stage] {
        &self.trace
    }

    pub fn reset_trace(&mut self) {
        self.trace.clear();
    }

    // =========================================================================
    // Stages
    // =========================================================================

    fn run_validation(&mut self) -> Result<(), SaveOutcome> {
        self.errors.clear();

        if self.run_hooks(Stage::BeforeValidation) == Flow::Halt {
            return Err(SaveOutcome::ValidationHalted);
        }

        tracing::debug!(presenter = %self.definition.name(), stage = %Stage::Validate, "Running stage");
        for index in 0..self.slots.len() {
            let Some(record) = self.slots[index].clone() else {
                continue;
            };
            record.borrow_mut().validate();
            self.merge_from(index);
        }

        let definition = Rc::clone(&self.definition);
        let mut own = Errors::new();
        for validator in definition.validators() {
            validator(&*self, &mut own);
        }
        self.errors.append(own);

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(SaveOutcome::Invalid)
        }
    }

    fn run_hooks(&mut self, stage: Stage) -> Flow {
        let definition = Rc::clone(&self.definition);
        let hooks = definition.hooks(stage);
        if hooks.is_empty() {
            return Flow::Continue;
        }

        tracing::debug!(presenter = %definition.name(), %stage, hooks = hooks.len(), "Running stage");
        for (position, hook) in hooks.iter().enumerate() {
            self.trace.push(stage);
            if hook(&mut *self) == Flow::Halt {
                tracing::warn!(presenter = %definition.name(), %stage, position, "Hook halted the chain");
                return Flow::Halt;
            }
        }
        Flow::Continue
    }

    /// Copy one slot's errors into the presenter's set under virtual names,
    /// in the record's declared attribute order
    fn merge_from(&mut self, index: usize) {
        let Some(record) = &self.slots[index] else {
            return;
        };
        let mut errors = record.borrow().errors().clone();

        let definition = Rc::clone(&self.definition);
        let slot = &definition.slots()[index];
        let order: Vec<&str> = slot.attributes().iter().map(|def| def.name).collect();

        errors.sort_by_declaration(&order);
        self.errors.merge_renamed(&errors, |attribute| {
            if attribute == BASE {
                BASE.to_string()
            } else {
                slot.virtual_name(attribute)
            }
        });
    }

    fn record_persist_failure(&mut self, slot: Option<usize>, failure: &PersistFailure) {
        let before = self.errors.len();
        if let Some(index) = slot {
            self.merge_from(index);
        }

        if let PersistFailure::Store(StoreError::UniqueViolation { table, column, .. }) = failure {
            let owner = slot.or_else(|| {
                self.slots
                    .iter()
                    .position(|record| {
                        record
                            .as_ref()
                            .is_some_and(|record| record.borrow().table_name() == table.as_str())
                    })
            });
            if let Some(index) = owner {
                let slot = &self.definition.slots()[index];
                let attribute = if slot.attributes().iter().any(|def| def.name == column.as_str()) {
                    slot.virtual_name(column)
                } else {
                    BASE.to_string()
                };
                self.errors.add(attribute, keys::TAKEN);
                return;
            }
        }

        if self.errors.len() == before {
            self.errors.add(BASE, keys::NOT_SAVED);
        }
    }
}
