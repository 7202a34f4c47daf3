//! Data layer for the primary sales dashboard.
//!
//! Reads raw spreadsheet exports, normalizes them onto the canonical schema,
//! persists and loads the canonical Parquet file, and computes the grouped
//! sums, top-state selection and per-view reports the UI renders.

pub mod aggregator;
pub mod analysis;
pub mod contribution;
pub mod convert;
pub mod normalizer;
pub mod reader;
pub mod store;

pub use sales_core as core;
