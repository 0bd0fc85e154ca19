//! Core use-case services.
//!
//! # Responsibility
//! - Reconcile habit log mutations into derived progress (`reconcile`).
//! - Expose session-level habit use cases with write-through persistence
//!   (`habit_service`).
//!
//! # See also
//! - docs/architecture/habit-engine.md

pub mod habit_service;
pub mod reconcile;
