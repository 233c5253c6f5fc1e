//! Transactional persister
//!
//! Saves every bound slot inside one store transaction; empty slots are
//! skipped. Either all writes commit
//! or none do, and on rollback each record's id, new-record flag and dirty
//! set are put back as they were before the attempt.

use crate::model::{SharedRecord, StateSnapshot};
use crate::store::{Store, StoreError};

/// Why the persist stage rolled back
#[derive(Debug, Clone, PartialEq)]
pub enum PersistFailure {
    /// A record's own save returned `false`
    Rejected,
    /// The store refused a write or the commit
    Store(StoreError),
}

/// Result of persisting every slot
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    Committed,
    RolledBack {
        /// Slot whose save failed; `None` when the commit itself failed
        slot: Option<usize>,
        failure: PersistFailure,
    },
}

impl PersistOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, PersistOutcome::Committed)
    }
}

/// Save `slots` in order inside a single transaction. Reported slot indices
/// count empty slots too.
pub fn persist_all(store: &Store, slots: &[Option<SharedRecord>]) -> PersistOutcome {
    let records: Vec<(usize, &SharedRecord)> = slots
        .iter()
        .enumerate()
        .filter_map(|(index, record)| Some((index, record.as_ref()?)))
        .collect();
    let snapshots: Vec<StateSnapshot> = records
        .iter()
        .map(|(_, record)| record.borrow().state().snapshot())
        .collect();

    let mut tx = store.begin();
    let transaction_id = tx.id();

    for &(index, record) in &records {
        let result = record.borrow_mut().save(&mut tx);
        let failure = match result {
            Ok(true) => continue,
            Ok(false) => PersistFailure::Rejected,
            Err(e) => PersistFailure::Store(e),
        };

        tracing::warn!(
            %transaction_id,
            slot = index,
            model = record.borrow().model_name(),
            ?failure,
            "Slot failed to save, rolling back"
        );
        tx.rollback();
        restore(&records, snapshots);
        return PersistOutcome::RolledBack {
            slot: Some(index),
            failure,
        };
    }

    match tx.commit() {
        Ok(()) => {
            tracing::info!(%transaction_id, records = records.len(), "Presenter records committed");
            PersistOutcome::Committed
        }
        Err(e) => {
            tracing::warn!(%transaction_id, error = %e, "Commit failed");
            restore(&records, snapshots);
            PersistOutcome::RolledBack {
                slot: None,
                failure: PersistFailure::Store(e),
            }
        }
    }
}

fn restore(records: &[(usize, &SharedRecord)], snapshots: Vec<StateSnapshot>) {
    for ((_, record), snapshot) in records.iter().zip(snapshots) {
        record.borrow_mut().state_mut().restore(snapshot);
    }
}
