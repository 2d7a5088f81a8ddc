//! Error types for the anofox-analytics library.

use thiserror::Error;

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur while generating or analysing behavioral data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// A configuration value is out of range or otherwise unusable.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// A feature column has zero variance and cannot be standardized.
    #[error("degenerate feature `{column}`: zero variance")]
    DegenerateFeature { column: String },

    /// Fewer rows or customers than the algorithm requires.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

impl AnalyticsError {
    /// Build an [`AnalyticsError::InvalidParameter`] from any displayable value.
    pub fn invalid(
        name: impl Into<String>,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        AnalyticsError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
