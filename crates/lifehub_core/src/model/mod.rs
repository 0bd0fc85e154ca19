//! Habit domain model.
//!
//! # Responsibility
//! - Define canonical habit and log-entry structures shared by engine,
//!   persistence and FFI layers.
//! - Own the wire shape (camelCase JSON, `YYYY-MM-DD` dates).
//!
//! # Invariants
//! - Every habit is identified by a stable `HabitId`.
//! - A habit log holds at most one entry per calendar date.
//! - Derived progress fields (`streak`, `experience`, `level`,
//!   `last_completed_date`) are written only by reconciliation.
//!
//! # See also
//! - docs/architecture/habit-engine.md

pub mod date;
pub mod habit;
