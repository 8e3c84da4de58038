//! Versioned, concurrency-safe table of the latest result per gatherer.
//!
//! One readers-writer lock guards the whole table. Each commit takes it
//! exclusively for the duration of a single entry update; snapshots take it
//! shared and copy the table, so every snapshot reflects one instant across
//! all entries and no result is ever observed half-written.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::SupervisorError;
use super::result::{GatherResult, Outcome};

#[derive(Debug, Default)]
struct Table {
    entries: BTreeMap<String, GatherResult>,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct ResultStore {
    table: RwLock<Table>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `name` in the not-ready state. An existing entry is left intact.
    pub fn insert(&self, name: &str) -> Result<(), SupervisorError> {
        match self.write().entries.entry(name.to_string()) {
            Entry::Occupied(_) => Err(SupervisorError::DuplicateName(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(GatherResult::default());
                Ok(())
            }
        }
    }

    /// Records a new sampling outcome for `name`, one generation after the
    /// current one, and returns the committed result.
    ///
    /// Returns `None` without writing once the store has been closed.
    pub fn commit(&self, name: &str, outcome: Outcome) -> Option<GatherResult> {
        let mut table = self.write();
        if table.closed {
            return None;
        }
        let generation = table.entries.get(name).map_or(0, GatherResult::generation) + 1;
        let result = GatherResult::new(generation, outcome);
        table.entries.insert(name.to_string(), result.clone());
        Some(result)
    }

    /// Freezes the table: every later commit is refused. Results stay readable.
    pub fn close(&self) {
        self.write().closed = true;
    }

    #[cfg(test)]
    fn is_closed(&self) -> bool {
        self.read().closed
    }

    pub fn get(&self, name: &str) -> Option<GatherResult> {
        self.read().entries.get(name).cloned()
    }

    /// Copies the whole table at one instant.
    pub fn snapshot(&self) -> BTreeMap<String, GatherResult> {
        self.read().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }
}
