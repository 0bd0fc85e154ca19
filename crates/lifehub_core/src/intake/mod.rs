//! Intake of externally generated habit proposals.
//!
//! AI output is untrusted input and goes through the same validation as
//! user input before any habit is admitted.

pub mod suggestion;
