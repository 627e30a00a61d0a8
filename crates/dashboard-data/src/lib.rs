//! Data layer for the sales dashboard.
//!
//! Responsible for reading the aggregated sales extract, exposing the
//! group-by and ranking operations over it, computing each dashboard view and
//! exporting the results as JSON.

pub mod aggregator;
pub mod export;
pub mod reader;
pub mod views;

pub use dashboard_core as core;
