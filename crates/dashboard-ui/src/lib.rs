//! Terminal UI layer for the sales dashboard.
//!
//! Provides themes, the header and sidebar components, bar chart and table
//! renderers, the per-view panel builders, and the main application event
//! loop built on top of [`ratatui`].

pub mod app;
pub mod chart_view;
pub mod components;
pub mod panels;
pub mod table_view;
pub mod themes;

pub use dashboard_core as core;
