//! Habit log storage and persistence.
//!
//! # Responsibility
//! - Hold working habit logs in memory (`HabitLogStore`).
//! - Persist per-user habit arrays through a local key-value store.
//!
//! # Invariants
//! - Read paths run `Habit::validate()` before handing records to services.
//! - Persistence errors are semantic (`QuotaExceeded`, `InvalidData`) in
//!   addition to SQLite transport errors.
//!
//! # See also
//! - docs/architecture/storage.md

pub mod habit_log_store;
pub mod habit_repo;
pub mod kv_store;
