//! Reusable building blocks shared by the dashboard views.

pub mod bars;
pub mod charts;
pub mod header;
pub mod kpi;
