use thiserror::Error;

use crate::parameters::expression::ExpressionError;
use crate::parameters::parameters::ParameterError;

/// Error types for the exprfit library.
#[derive(Error, Debug)]
pub enum FitError {
    /// No data points remain after range restriction.
    #[error("No data values. Not fitting.")]
    NoData,

    /// Independent, dependent and error arrays differ in length.
    #[error("Fit data not equal in length (x: {x}, y: {y}, yerr: {yerr}). Not fitting.")]
    LengthMismatch { x: usize, y: usize, yerr: usize },

    /// More parameters than data points.
    #[error("No degrees of freedom for fit ({parameters} parameters, {points} points). Not fitting.")]
    NoDegreesOfFreedom { parameters: usize, points: usize },

    /// A dataset named in the settings does not exist.
    #[error("Dataset not found: {0}")]
    MissingDataset(String),

    /// Error parsing or compiling the fit expression.
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// Error for parameter-set problems.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Error indicating a mismatch in array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Any other solver failure.
    #[error("Solver error: {0}")]
    Solver(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FitError {
    /// Whether this error is one of the input validation failures that abort
    /// a fit before the solver runs.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            FitError::NoData
                | FitError::LengthMismatch { .. }
                | FitError::NoDegreesOfFreedom { .. }
                | FitError::MissingDataset(_)
        )
    }
}

/// Result type alias for exprfit operations.
pub type Result<T> = std::result::Result<T, FitError>;
