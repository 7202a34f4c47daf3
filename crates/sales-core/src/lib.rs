//! Core types for the primary sales dashboard.
//!
//! Holds the canonical record model, the per-dimension filter engine, the
//! shared error type, CLI settings, and number/currency formatting used by
//! every other crate in the workspace.

pub mod error;
pub mod filters;
pub mod formatting;
pub mod models;
pub mod settings;
