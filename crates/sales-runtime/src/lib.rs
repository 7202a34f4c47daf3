//! Runtime layer for the primary sales dashboard.
//!
//! Holds the TTL table cache and the interactive session that turns filter
//! state into the reports drawn by the UI.

pub mod data_manager;
pub mod session;

pub use sales_core as core;
pub use sales_data as data;
