//! Error types for the grouping core.
//!
//! Validation failures are reported before any random draw is made, so a
//! caller that receives one of these errors can be sure no partial grouping
//! was produced.

use thiserror::Error;

/// Errors raised by the grouping, scoring and refinement operations.
#[derive(Error, Debug)]
pub enum GroupingError {
    // ============ Input Shape ============
    /// The input table has no rows.
    #[error("input table is empty")]
    EmptyTable,

    /// No layering covariates were requested.
    #[error("layers must be specified")]
    EmptyLayers,

    /// Group count must be a positive integer.
    #[error("group_count must be a positive integer, got {0}")]
    InvalidGroupCount(usize),

    /// A search or refinement parameter is out of range.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Description of what is invalid.
        message: String,
    },

    // ============ Columns ============
    /// One or more requested layer columns are absent from the table.
    #[error("invalid layer columns: {}", .0.join(", "))]
    UnknownColumns(Vec<String>),

    /// None of the requested layer columns is numeric.
    #[error("no valid numeric columns found for layering (requested: {})", .0.join(", "))]
    NoNumericCovariates(Vec<String>),

    /// A column handed to the binner is not numeric.
    #[error("column '{0}' is not numeric")]
    NonNumericColumn(String),

    /// A numeric column contains no usable values.
    #[error("column '{0}' contains only missing values")]
    EmptyCovariate(String),

    // ============ Allocation ============
    /// Explicit group sizes have the wrong number of entries.
    #[error("group_sizes must have {expected} elements, but has {actual}")]
    AllocationLength {
        /// Number of groups requested.
        expected: usize,
        /// Number of sizes supplied.
        actual: usize,
    },

    /// Explicit group sizes do not add up to the usable subject count.
    #[error("sum of group_sizes ({requested}) does not match usable subject count ({available})")]
    AllocationSum {
        /// Sum of the supplied sizes.
        requested: usize,
        /// Subjects available after stratum filtering.
        available: usize,
    },

    // ============ Persistence ============
    /// No stored grouping exists under the identifier.
    #[error("grouping result '{0}' not found")]
    NotFound(String),

    /// The store could not be read or written.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be encoded or decoded.
    #[error("store serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    // ============ Data Backend ============
    /// The dataframe backend reported a failure.
    #[error("data error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl GroupingError {
    /// Shorthand for an [`GroupingError::InvalidParameter`].
    pub fn invalid(message: impl Into<String>) -> Self {
        GroupingError::InvalidParameter {
            message: message.into(),
        }
    }

    /// True for errors caused by the caller's input rather than by I/O or lookup.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            GroupingError::NotFound(_)
                | GroupingError::Io(_)
                | GroupingError::Serde(_)
                | GroupingError::Polars(_)
        )
    }
}

/// Result alias used throughout the grouping core.
pub type Result<T> = std::result::Result<T, GroupingError>;
