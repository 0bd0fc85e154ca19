//! Habit use-case service.
//!
//! # Responsibility
//! - Own the session's habit list, reconciliation and persistence.
//! - Provide stable entry points for FFI and CLI callers.
//!
//! # Invariants
//! - Mutations are applied to memory first, then written through.
//! - A failed write never rolls back memory; it is reported as a
//!   `PersistenceWarning` and memory stays authoritative for the session.
//! - Validation failures leave both memory and storage untouched.

use crate::engine::stats::{habit_stats, HabitStats};
use crate::intake::suggestion::{parse_suggestions, SuggestionRejection};
use crate::model::habit::{
    CustomFrequencyDetails, EntryDetails, Frequency, Habit, HabitId, TimeOfDay, ValidationError,
};
use crate::repo::habit_repo::HabitRepository;
use crate::repo::kv_store::{KeyValueStore, RepoError};
use crate::service::reconcile::ReconciliationOrchestrator;
use chrono::NaiveDate;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for habit use-cases.
#[derive(Debug)]
pub enum HabitServiceError {
    HabitNotFound(HabitId),
    Validation(ValidationError),
    /// Initial load failed; no session state exists yet.
    Repo(RepoError),
}

impl Display for HabitServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HabitServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::HabitNotFound(_) => None,
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for HabitServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for HabitServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Non-fatal report of a failed write-through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceWarning {
    pub storage_key: String,
    pub message: String,
}

impl Display for PersistenceWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "changes kept for this session but not saved to `{}`: {}",
            self.storage_key, self.message
        )
    }
}

/// Result of one successful habit mutation.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub habit: Habit,
    pub persistence_warning: Option<PersistenceWarning>,
}

/// Result of admitting one batch of AI suggestions.
#[derive(Debug, Clone)]
pub struct SuggestionIntakeOutcome {
    pub accepted: Vec<Habit>,
    pub rejected: Vec<SuggestionRejection>,
    pub persistence_warning: Option<PersistenceWarning>,
}

/// User input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDraft {
    pub title: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub custom_frequency_details: Option<CustomFrequencyDetails>,
    pub time_of_day: TimeOfDay,
}

impl HabitDraft {
    pub fn new(title: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            title: title.into(),
            description: None,
            frequency,
            custom_frequency_details: None,
            time_of_day: TimeOfDay::Any,
        }
    }
}

/// Session facade over one user's habits.
pub struct HabitService<S: KeyValueStore> {
    repo: HabitRepository<S>,
    habits: Vec<Habit>,
    reconciler: ReconciliationOrchestrator,
}

impl<S: KeyValueStore> HabitService<S> {
    /// Creates a session with no habits, without reading storage.
    pub fn new(repo: HabitRepository<S>) -> Self {
        Self {
            repo,
            habits: Vec::new(),
            reconciler: ReconciliationOrchestrator::new(),
        }
    }

    /// Creates a session from the habits currently stored for `repo`.
    pub fn load(repo: HabitRepository<S>) -> Result<Self, HabitServiceError> {
        let habits = repo.load()?;
        info!(
            "event=habits_load module=service status=ok count={}",
            habits.len()
        );
        Ok(Self {
            repo,
            habits,
            reconciler: ReconciliationOrchestrator::new(),
        })
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn get(&self, id: HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    /// Creates a habit from user input.
    pub fn create_habit(&mut self, draft: HabitDraft) -> Result<MutationOutcome, HabitServiceError> {
        let mut habit = Habit::new(&draft.title, draft.frequency)?;
        habit.description = draft
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        habit.custom_frequency_details = draft.custom_frequency_details;
        habit.time_of_day = draft.time_of_day;

        self.habits.push(habit.clone());
        info!(
            "event=habit_create module=service status=ok habit_id={}",
            habit.id
        );
        Ok(MutationOutcome {
            habit,
            persistence_warning: self.persist(),
        })
    }

    /// Deletes a habit together with its log.
    pub fn delete_habit(
        &mut self,
        id: HabitId,
    ) -> Result<Option<PersistenceWarning>, HabitServiceError> {
        let index = self.index_of(id)?;
        let removed = self.habits.remove(index);
        self.reconciler.forget(&removed);
        info!("event=habit_delete module=service status=ok habit_id={id}");
        Ok(self.persist())
    }

    /// Records a completion on `date` (`YYYY-MM-DD`).
    pub fn complete(
        &mut self,
        id: HabitId,
        date: &str,
        details: EntryDetails,
    ) -> Result<MutationOutcome, HabitServiceError> {
        self.mutate(id, |reconciler, habit| {
            reconciler.record_completion(habit, date, details)
        })
    }

    /// Marks `date` (`YYYY-MM-DD`) as not completed.
    pub fn uncomplete(&mut self, id: HabitId, date: &str) -> Result<MutationOutcome, HabitServiceError> {
        self.mutate(id, |reconciler, habit| {
            reconciler.record_uncompletion(habit, date)
        })
    }

    /// Deletes the log entry on `date` (`YYYY-MM-DD`).
    pub fn remove_entry(
        &mut self,
        id: HabitId,
        date: &str,
    ) -> Result<MutationOutcome, HabitServiceError> {
        self.mutate(id, |reconciler, habit| reconciler.remove_entry(habit, date))
    }

    /// Validates a raw suggestion response and admits every valid habit.
    ///
    /// # Errors
    /// - `Validation(MalformedPayload)` when the response is not usable JSON;
    ///   nothing is admitted in that case.
    pub fn accept_suggestions(
        &mut self,
        raw: &str,
    ) -> Result<SuggestionIntakeOutcome, HabitServiceError> {
        let batch = parse_suggestions(raw)?;
        let persistence_warning = if batch.accepted.is_empty() {
            None
        } else {
            self.habits.extend(batch.accepted.iter().cloned());
            self.persist()
        };

        Ok(SuggestionIntakeOutcome {
            accepted: batch.accepted,
            rejected: batch.rejected,
            persistence_warning,
        })
    }

    /// Computes dashboard statistics for one habit as seen on `today`.
    pub fn stats(
        &self,
        id: HabitId,
        today: NaiveDate,
        window_days: u32,
    ) -> Result<HabitStats, HabitServiceError> {
        let habit = self.get(id).ok_or(HabitServiceError::HabitNotFound(id))?;
        Ok(habit_stats(habit.log(), today, window_days))
    }

    fn mutate(
        &mut self,
        id: HabitId,
        apply: impl FnOnce(&mut ReconciliationOrchestrator, &Habit) -> Result<Habit, ValidationError>,
    ) -> Result<MutationOutcome, HabitServiceError> {
        let index = self.index_of(id)?;
        let updated = apply(&mut self.reconciler, &self.habits[index])?;

        if updated == self.habits[index] {
            return Ok(MutationOutcome {
                habit: updated,
                persistence_warning: None,
            });
        }

        self.habits[index] = updated.clone();
        Ok(MutationOutcome {
            habit: updated,
            persistence_warning: self.persist(),
        })
    }

    fn index_of(&self, id: HabitId) -> Result<usize, HabitServiceError> {
        self.habits
            .iter()
            .position(|habit| habit.id == id)
            .ok_or(HabitServiceError::HabitNotFound(id))
    }

    fn persist(&self) -> Option<PersistenceWarning> {
        match self.repo.save(&self.habits) {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    "event=habits_persist module=service status=error storage_key={} error={err}",
                    self.repo.storage_key()
                );
                Some(PersistenceWarning {
                    storage_key: self.repo.storage_key().to_string(),
                    message: err.to_string(),
                })
            }
        }
    }
}
