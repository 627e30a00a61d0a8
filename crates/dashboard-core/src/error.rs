use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the sales dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The extract could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured extract path does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// An extract directory contained no `part-*` files.
    #[error("No part files found in {0}")]
    NoDataFiles(PathBuf),

    /// An operation needed at least one record in scope and found none.
    #[error("No records in scope: {0}")]
    EmptyScope(String),

    /// A group the caller asked for does not appear in the grouped result.
    #[error("Group not present in result: {0}")]
    MissingGroup(String),

    /// A growth rate was requested against a zero baseline.
    #[error("Baseline {0} is zero; growth is undefined")]
    ZeroBaseline(String),

    /// A ratio was requested against a total that is zero or negative.
    #[error("Total must be positive to compute a share, got {0}")]
    NonPositiveTotal(f64),

    /// A grouped table had the wrong number of key dimensions for the
    /// requested operation.
    #[error("Expected {expected} grouping dimensions, found {found}")]
    DimensionArity { expected: usize, found: usize },

    /// A JSON document could not be produced or parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The interactive terminal could not be set up, drawn or read.
    #[error("Terminal error: {0}")]
    Terminal(#[source] std::io::Error),
}

impl DashboardError {
    /// `true` for failures to obtain the input resource at all, as opposed to
    /// precondition failures inside an aggregation.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            DashboardError::FileRead { .. }
                | DashboardError::DataPathNotFound(_)
                | DashboardError::NoDataFiles(_)
        )
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
