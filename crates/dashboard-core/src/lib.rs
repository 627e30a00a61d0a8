//! Shared domain types for the sales dashboard.
//!
//! Holds the record and dataset model, the dimension / measure / view
//! enumerations, the error type, CLI settings and number formatting.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{DashboardError, Result};
