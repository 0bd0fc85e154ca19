//! Habit log reconciliation.
//!
//! # Responsibility
//! - Route every log mutation through `HabitLogStore`.
//! - Recompute streak and progression from the full updated log.
//! - Return a new `Habit` with all derived fields replaced together.
//!
//! # Invariants
//! - The input habit is never mutated; failures leave the caller's value as is.
//! - Streaks come from a full rescan, so backfills and gap fills are handled
//!   the same way as appends.
//! - Experience is granted only on a transition into completed and deducted
//!   only on a transition out of completed. Re-applying the same mutation
//!   yields the same habit.
//!
//! # See also
//! - docs/architecture/habit-engine.md

use crate::engine::progression::{apply_completion_event, apply_uncompletion_event};
use crate::engine::streak::compute_streak;
use crate::model::date::parse_calendar_date;
use crate::model::habit::{EntryDetails, Habit, HabitLogEntry, ValidationError};
use crate::repo::habit_log_store::HabitLogStore;
use chrono::NaiveDate;
use log::{debug, info};

/// Coordinates log mutations and derived-field recomputation.
#[derive(Debug, Default)]
pub struct ReconciliationOrchestrator {
    store: HabitLogStore,
}

impl ReconciliationOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the working logs.
    pub fn store(&self) -> &HabitLogStore {
        &self.store
    }

    /// Drops the working log of a deleted habit.
    pub fn forget(&mut self, habit: &Habit) {
        self.store.forget(habit.id);
    }

    /// Records a completion for a wire-format `date`.
    ///
    /// # Errors
    /// - `MalformedDate` when `date` is not `YYYY-MM-DD`; nothing is mutated.
    pub fn record_completion(
        &mut self,
        habit: &Habit,
        date: &str,
        details: EntryDetails,
    ) -> Result<Habit, ValidationError> {
        let date = parse_calendar_date(date)?;
        Ok(self.record_completion_on(habit, date, details))
    }

    /// Records a completion for an already-parsed date.
    pub fn record_completion_on(
        &mut self,
        habit: &Habit,
        date: NaiveDate,
        details: EntryDetails,
    ) -> Habit {
        self.store.hydrate(habit.id, habit.log.clone());

        let entry = HabitLogEntry::completed(date, details);
        let quality = entry.details.quality;
        let previous = self.store.upsert(habit.id, entry.clone());
        if previous.as_ref() == Some(&entry) {
            debug!(
                "event=habit_reconcile module=reconcile status=noop action=complete habit_id={} date={date}",
                habit.id
            );
            return habit.clone();
        }

        let log = self.store.get(habit.id);
        let summary = compute_streak(&log);
        let was_completed = previous.is_some_and(|entry| entry.completed);
        let progress = if was_completed {
            habit.progress()
        } else {
            apply_completion_event(habit.progress(), summary.streak, quality)
        };

        let updated = habit.reconciled(log, summary, progress);
        info!(
            "event=habit_reconcile module=reconcile status=ok action=complete habit_id={} date={date} streak={} level={} experience={} xp_granted={}",
            updated.id,
            updated.streak,
            updated.level,
            updated.experience,
            !was_completed
        );
        updated
    }

    /// Marks the entry at a wire-format `date` as not completed.
    ///
    /// # Errors
    /// - `MalformedDate` when `date` is not `YYYY-MM-DD`; nothing is mutated.
    pub fn record_uncompletion(
        &mut self,
        habit: &Habit,
        date: &str,
    ) -> Result<Habit, ValidationError> {
        let date = parse_calendar_date(date)?;
        Ok(self.record_uncompletion_on(habit, date))
    }

    /// Marks the entry at `date` as not completed, keeping its details.
    pub fn record_uncompletion_on(&mut self, habit: &Habit, date: NaiveDate) -> Habit {
        self.store.hydrate(habit.id, habit.log.clone());

        let was_completed = match self.store.entry(habit.id, date) {
            Some(existing) if !existing.completed => {
                debug!(
                    "event=habit_reconcile module=reconcile status=noop action=uncomplete habit_id={} date={date}",
                    habit.id
                );
                return habit.clone();
            }
            Some(_) => true,
            None => false,
        };

        let entry = match self.store.entry(habit.id, date) {
            Some(existing) => HabitLogEntry {
                completed: false,
                ..existing.clone()
            },
            None => HabitLogEntry::not_completed(date),
        };
        self.store.upsert(habit.id, entry);

        self.finish_removal(habit, date, was_completed, "uncomplete")
    }

    /// Deletes the entry at a wire-format `date` outright.
    ///
    /// # Errors
    /// - `MalformedDate` when `date` is not `YYYY-MM-DD`; nothing is mutated.
    pub fn remove_entry(&mut self, habit: &Habit, date: &str) -> Result<Habit, ValidationError> {
        let date = parse_calendar_date(date)?;
        Ok(self.remove_entry_on(habit, date))
    }

    /// Deletes the entry at `date`; absent entries leave the habit unchanged.
    pub fn remove_entry_on(&mut self, habit: &Habit, date: NaiveDate) -> Habit {
        self.store.hydrate(habit.id, habit.log.clone());

        let Some(removed) = self.store.remove(habit.id, date) else {
            debug!(
                "event=habit_reconcile module=reconcile status=noop action=remove habit_id={} date={date}",
                habit.id
            );
            return habit.clone();
        };

        self.finish_removal(habit, date, removed.completed, "remove")
    }

    fn finish_removal(
        &self,
        habit: &Habit,
        date: NaiveDate,
        was_completed: bool,
        action: &'static str,
    ) -> Habit {
        let log = self.store.get(habit.id);
        let summary = compute_streak(&log);
        let progress = if was_completed {
            apply_uncompletion_event(habit.progress())
        } else {
            habit.progress()
        };

        let updated = habit.reconciled(log, summary, progress);
        info!(
            "event=habit_reconcile module=reconcile status=ok action={action} habit_id={} date={date} streak={} level={} experience={} xp_deducted={was_completed}",
            updated.id, updated.streak, updated.level, updated.experience
        );
        updated
    }
}
