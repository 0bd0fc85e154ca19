//! Pure habit engagement computations.
//!
//! # Responsibility
//! - Derive streaks and progression from explicit log snapshots.
//! - Stay free of storage, logging and clock access.
//!
//! # Invariants
//! - Every function here is total: no input makes it fail or panic.
//! - Streaks are always recomputed from the full log, never patched.

pub mod progression;
pub mod stats;
pub mod streak;
