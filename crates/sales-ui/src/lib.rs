//! Terminal UI layer for the primary sales dashboard.
//!
//! Provides themes, bar/chart/header/KPI components, the Sales Overview and
//! Top Markets views, the filter panel overlay, and the main application
//! event loop built on top of [`ratatui`].

pub mod app;
pub mod components;
pub mod filter_panel;
pub mod markets_view;
pub mod overview_view;
pub mod table_view;
pub mod themes;

pub use sales_core as core;
