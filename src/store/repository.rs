//! Store Repository
//!
//! Tables of rows keyed by record id, plus the transaction handle records
//! write through. A transaction buffers its writes and applies them in one
//! step on commit; rollback (explicit or on drop) simply discards them.

use indexmap::IndexMap;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;

use crate::domain::Value;

use super::{StoreError, StoreResult};

/// A stored row: column name to value, in column order
pub type Row = IndexMap<String, Value>;

type Table = IndexMap<Uuid, Row>;

/// Transaction counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

#[derive(Debug, Default)]
struct Tables {
    tables: HashMap<String, Table>,
    unique: Vec<(String, String)>,
    stats: StoreStats,
}

/// Shared handle to an in-memory store.
///
/// Cloning the handle shares the same tables. The store is single-threaded;
/// callers serialize access.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Rc<RefCell<Tables>>,
}

impl Store {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a unique column
    pub fn unique(self, table: &str, column: &str) -> Self {
        self.inner
            .borrow_mut()
            .unique
            .push((table.to_string(), column.to_string()));
        self
    }

    /// Begin a new transaction
    pub fn begin(&self) -> Transaction {
        self.inner.borrow_mut().stats.begun += 1;
        let tx = Transaction {
            store: self.clone(),
            id: Uuid::new_v4(),
            writes: Vec::new(),
            state: TransactionState::Active,
        };
        tracing::debug!(transaction_id = %tx.id, "Transaction begun");
        tx
    }

    /// Fetch a committed row
    pub fn find(&self, table: &str, id: Uuid) -> Option<Row> {
        self.inner
            .borrow()
            .tables
            .get(table)
            .and_then(|rows| rows.get(&id))
            .cloned()
    }

    /// Number of committed rows in a table
    pub fn count(&self, table: &str) -> usize {
        self.inner
            .borrow()
            .tables
            .get(table)
            .map(IndexMap::len)
            .unwrap_or(0)
    }

    pub fn stats(&self) -> StoreStats {
        self.inner.borrow().stats.clone()
    }

    fn unique_columns(&self, table: &str) -> Vec<String> {
        self.inner
            .borrow()
            .unique
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, column)| column.clone())
            .collect()
    }

    fn committed_table(&self, table: &str) -> Table {
        self.inner
            .borrow()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

/// Transaction lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

#[derive(Debug)]
enum PendingWrite {
    Insert { table: String, id: Uuid, row: Row },
    Update { table: String, id: Uuid, row: Row },
}

impl PendingWrite {
    fn table(&self) -> &str {
        match self {
            PendingWrite::Insert { table, .. } | PendingWrite::Update { table, .. } => table,
        }
    }
}

/// Explicit transaction handle.
///
/// Dropping an active transaction rolls it back.
#[derive(Debug)]
pub struct Transaction {
    store: Store,
    id: Uuid,
    writes: Vec<PendingWrite>,
    state: TransactionState,
}

impl Transaction {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Stage a new row and return its generated id
    pub fn insert(&mut self, table: &str, row: Row) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        let view = self.view(table);
        check_unique(&self.store.unique_columns(table), table, id, &row, &view)?;

        self.writes.push(PendingWrite::Insert {
            table: table.to_string(),
            id,
            row,
        });
        Ok(id)
    }

    /// Stage a replacement for an existing row
    pub fn update(&mut self, table: &str, id: Uuid, row: Row) -> StoreResult<()> {
        let view = self.view(table);
        if !view.contains_key(&id) {
            return Err(StoreError::RowNotFound {
                table: table.to_string(),
                id,
            });
        }
        check_unique(&self.store.unique_columns(table), table, id, &row, &view)?;

        self.writes.push(PendingWrite::Update {
            table: table.to_string(),
            id,
            row,
        });
        Ok(())
    }

    /// Apply every staged write atomically.
    ///
    /// Constraints are re-checked against the committed state; on any
    /// violation nothing is applied and the transaction is rolled back.
    pub fn commit(mut self) -> StoreResult<()> {
        let writes = std::mem::take(&mut self.writes);

        let mut touched: HashMap<String, Table> = HashMap::new();
        for write in &writes {
            let table = write.table();
            if !touched.contains_key(table) {
                touched.insert(table.to_string(), self.store.committed_table(table));
            }
        }

        for write in writes {
            let (table, id, row, is_update) = match write {
                PendingWrite::Insert { table, id, row } => (table, id, row, false),
                PendingWrite::Update { table, id, row } => (table, id, row, true),
            };
            let unique = self.store.unique_columns(&table);
            let rows = touched.entry(table.clone()).or_default();

            let outcome = if is_update && !rows.contains_key(&id) {
                Err(StoreError::RowNotFound {
                    table: table.clone(),
                    id,
                })
            } else {
                check_unique(&unique, &table, id, &row, rows)
            };

            if let Err(e) = outcome {
                self.finish_rollback();
                return Err(e);
            }
            rows.insert(id, row);
        }

        {
            let mut inner = self.store.inner.borrow_mut();
            inner.tables.extend(touched);
            inner.stats.committed += 1;
        }
        self.state = TransactionState::Committed;
        tracing::debug!(transaction_id = %self.id, "Transaction committed");
        Ok(())
    }

    /// Discard every staged write
    pub fn rollback(mut self) {
        self.finish_rollback();
    }

    fn finish_rollback(&mut self) {
        if self.state != TransactionState::Active {
            return;
        }
        let discarded = self.writes.len();
        self.writes.clear();
        self.state = TransactionState::RolledBack;
        self.store.inner.borrow_mut().stats.rolled_back += 1;
        tracing::warn!(transaction_id = %self.id, discarded, "Transaction rolled back");
    }

    /// Committed rows of `table` overlaid with this transaction's writes
    fn view(&self, table: &str) -> Table {
        let mut rows = self.store.committed_table(table);
        for write in &self.writes {
            match write {
                PendingWrite::Insert { table: t, id, row } | PendingWrite::Update { table: t, id, row }
                    if t == table =>
                {
                    rows.insert(*id, row.clone());
                }
                _ => {}
            }
        }
        rows
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        self.finish_rollback();
    }
}

fn check_unique(
    columns: &[String],
    table: &str,
    id: Uuid,
    row: &Row,
    existing: &Table,
) -> StoreResult<()> {
    for column in columns {
        let value = match row.get(column) {
            Some(value) if !value.is_null() => value,
            _ => continue,
        };
        let taken = existing
            .iter()
            .any(|(other_id, other)| *other_id != id && other.get(column) == Some(value));
        if taken {
            return Err(StoreError::UniqueViolation {
                table: table.to_string(),
                column: column.clone(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}
