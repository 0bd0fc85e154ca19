//! Flutter-facing bridge over `lifehub_core`.

pub mod api;
