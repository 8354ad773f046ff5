//! # exprfit
//!
//! `exprfit` fits a user-written function such as `a + b*x` to a pair of
//! data series and reports the fitted parameter values together with the
//! chi-square statistics of the fit.
//!
//! The library provides:
//! - A small expression language, parsed once and compiled for fast
//!   repeated evaluation
//! - Preparation of observations: error synthesis, range restriction and
//!   validation
//! - A Levenberg-Marquardt optimizer that tolerates functions which cannot be
//!   evaluated everywhere
//! - Severity-tagged diagnostics, forwarded to the `log` facade
//!
//! ## Basic Usage
//!
//! ```
//! use std::collections::HashMap;
//!
//! use exprfit::{Dataset, Diagnostics, Fit, FitSettings, NoAxes, ParameterSet};
//! use ndarray::array;
//!
//! let mut data = HashMap::new();
//! data.insert("t".to_string(), Dataset::new(array![0.0, 1.0, 2.0, 3.0, 4.0]));
//! data.insert("v".to_string(), Dataset::new(array![0.1, 2.1, 3.9, 6.2, 7.9]));
//!
//! let settings = FitSettings {
//!     function: "v0 + g*x".to_string(),
//!     values: ParameterSet::from_pairs([("v0", 0.0), ("g", 1.0)]).unwrap(),
//!     x_data: "t".to_string(),
//!     y_data: "v".to_string(),
//!     ..FitSettings::default()
//! };
//!
//! let mut fit = Fit::with_settings(settings);
//! let mut diagnostics = Diagnostics::new();
//! let outcome = fit.fit(&data, &NoAxes, &mut diagnostics).unwrap();
//!
//! assert!(outcome.converged);
//! assert_eq!(fit.result().dof, 3);
//! // No errors were given, so 5% errors were assumed
//! assert_eq!(diagnostics.warnings().len(), 1);
//! ```

// Public modules
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod fit;
pub mod lm;
pub mod model;
pub mod parameters;
pub mod problem;
pub mod solver;

mod utils;

// Re-exports for convenience
pub use data::{AxisSource, DataSource, Dataset, NoAxes};
pub use diagnostics::{Diagnostic, Diagnostics, FitStage, Severity};
pub use error::{FitError, Result};
pub use fit::{Fit, FitOutcome, FitResult, FitSettings, Variable};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use model::{ExpressionModel, ModelFunction};
pub use parameters::{Expression, ParameterSet};
pub use problem::Problem;
pub use solver::{CurveSolver, SolverOutput};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
