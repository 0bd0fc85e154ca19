//! In-memory per-habit log store.
//!
//! # Responsibility
//! - Hold the working copy of each habit log during reconciliation.
//! - Enforce (habit, date) uniqueness through upsert semantics.
//!
//! # Invariants
//! - Last write wins for one (habit, date) key.
//! - Removing an absent entry is a no-op, not an error.
//! - Single writer; no locking.

use crate::model::habit::{HabitId, HabitLog, HabitLogEntry};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Date-keyed log entries grouped by habit.
#[derive(Debug, Clone, Default)]
pub struct HabitLogStore {
    logs: BTreeMap<HabitId, HabitLog>,
}

impl HabitLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored log for `habit_id` with a snapshot.
    pub fn hydrate(&mut self, habit_id: HabitId, log: HabitLog) {
        self.logs.insert(habit_id, log);
    }

    /// Inserts or replaces the entry for `entry.date`.
    ///
    /// Returns the replaced entry, if any.
    pub fn upsert(&mut self, habit_id: HabitId, entry: HabitLogEntry) -> Option<HabitLogEntry> {
        self.logs.entry(habit_id).or_default().upsert(entry)
    }

    /// Removes the entry at `date` when present.
    pub fn remove(&mut self, habit_id: HabitId, date: NaiveDate) -> Option<HabitLogEntry> {
        self.logs.get_mut(&habit_id)?.remove(date)
    }

    /// Returns the full date-ordered log; unknown habits have an empty log.
    pub fn get(&self, habit_id: HabitId) -> HabitLog {
        self.logs.get(&habit_id).cloned().unwrap_or_default()
    }

    pub fn entry(&self, habit_id: HabitId, date: NaiveDate) -> Option<&HabitLogEntry> {
        self.logs.get(&habit_id)?.get(date)
    }

    /// Drops everything stored for `habit_id`.
    pub fn forget(&mut self, habit_id: HabitId) -> Option<HabitLog> {
        self.logs.remove(&habit_id)
    }

    pub fn contains(&self, habit_id: HabitId) -> bool {
        self.logs.contains_key(&habit_id)
    }
}
