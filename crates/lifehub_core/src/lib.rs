//! Core domain logic for LifeHub habits.
//! This crate is the single source of truth for habit engagement invariants.

pub mod config;
pub mod db;
pub mod engine;
pub mod intake;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{storage_key_for, ConfigError, StorageConfig};
pub use engine::progression::{
    apply_completion_event, apply_uncompletion_event, experience_to_next_level, Progress,
};
pub use engine::stats::{habit_stats, HabitStats, DEFAULT_WINDOW_DAYS};
pub use engine::streak::{compute_streak, compute_streak_as_of, longest_streak, StreakSummary};
pub use intake::suggestion::{
    parse_suggestions, validate_suggestion, SuggestionBatch, SuggestionRejection,
};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::date::{format_calendar_date, parse_calendar_date};
pub use model::habit::{
    CustomFrequencyDetails, Emotion, EntryDetails, Frequency, Habit, HabitId, HabitLog,
    HabitLogEntry, Quality, TimeOfDay, ValidationError,
};
pub use repo::habit_log_store::HabitLogStore;
pub use repo::habit_repo::HabitRepository;
pub use repo::kv_store::{
    KeyValueStore, MemoryKeyValueStore, RepoError, RepoResult, SqliteKeyValueStore,
};
pub use service::habit_service::{
    HabitDraft, HabitService, HabitServiceError, MutationOutcome, PersistenceWarning,
    SuggestionIntakeOutcome,
};
pub use service::reconcile::ReconciliationOrchestrator;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
