//! # Fitting
//!
//! The [`Fit`] object ties the pieces together: it holds the user's
//! [`FitSettings`] and the [`FitResult`] of the last fit, and runs a fit in
//! three stages.
//!
//! 1. Preparing: the parameter names are sorted and their values laid out as
//!    the initial vector, and the observations are prepared (see
//!    [`prepare`](prepare::prepare)). Any failure aborts the fit.
//! 2. Solving: the fit function is compiled into an
//!    [`ExpressionModel`](crate::model::ExpressionModel) and handed to the
//!    solver together with the observations.
//! 3. Summarizing: fitted values are written back under the same sorted
//!    names, the statistics computed and the function rendered as text.
//!
//! Settings and result are only replaced once all three stages succeed.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use exprfit::data::{Dataset, NoAxes};
//! use exprfit::diagnostics::Diagnostics;
//! use exprfit::fit::Fit;
//! use ndarray::array;
//!
//! let mut data = HashMap::new();
//! data.insert("x".to_string(), Dataset::new(array![0.0, 1.0, 2.0, 3.0]));
//! data.insert(
//!     "y".to_string(),
//!     Dataset::new(array![1.0, 3.0, 5.0, 7.0]).with_symmetric_error(array![0.1, 0.1, 0.1, 0.1]),
//! );
//!
//! let mut fit = Fit::new();
//! let mut diagnostics = Diagnostics::new();
//! fit.fit(&data, &NoAxes, &mut diagnostics).unwrap();
//!
//! assert!((fit.settings().values.get("a").unwrap() - 1.0).abs() < 1e-6);
//! assert!((fit.settings().values.get("b").unwrap() - 2.0).abs() < 1e-6);
//! assert_eq!(fit.result().dof, 2);
//! ```

pub mod prepare;
pub mod render;
pub mod settings;

use ndarray::Array1;

use crate::data::{AxisSource, DataSource};
use crate::diagnostics::{Diagnostics, FitStage};
use crate::error::{FitError, Result};
use crate::lm::LevenbergMarquardt;
use crate::model::{ExpressionModel, ModelFunction};
use crate::solver::CurveSolver;

pub use prepare::{prepare, synthesize_errors, Observations};
pub use render::{render, tokenize};
pub use settings::{FitResult, FitSettings, Variable};

/// Summary of one successful fit run.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// The statistics stored in the fit object
    pub result: FitResult,

    /// Whether the solver reported convergence
    pub converged: bool,

    /// Number of solver iterations
    pub iterations: usize,

    /// The solver's termination message
    pub message: String,
}

/// Reduced chi-square, or `None` if there are no degrees of freedom.
pub fn reduced_chi_square(chi2: f64, dof: i64) -> Option<f64> {
    if dof > 0 {
        Some(chi2 / dof as f64)
    } else {
        None
    }
}

/// A fit of a user-written function to two datasets.
#[derive(Debug, Clone, Default)]
pub struct Fit {
    settings: FitSettings,
    result: FitResult,
    solver: LevenbergMarquardt,
}

impl Fit {
    /// A fit with default settings (`a + b*x` against datasets `x` and `y`).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: FitSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Use a differently configured optimizer for [`Fit::fit`].
    pub fn with_solver(mut self, solver: LevenbergMarquardt) -> Self {
        self.solver = solver;
        self
    }

    pub fn settings(&self) -> &FitSettings {
        &self.settings
    }

    /// Mutable access to the settings, e.g. to change the function or the
    /// starting values before the next fit.
    pub fn settings_mut(&mut self) -> &mut FitSettings {
        &mut self.settings
    }

    /// The result of the last successful fit.
    pub fn result(&self) -> &FitResult {
        &self.result
    }

    /// Fit the configured function with the Levenberg-Marquardt optimizer.
    ///
    /// See [`Fit::fit_with`].
    pub fn fit(
        &mut self,
        data: &dyn DataSource,
        axes: &dyn AxisSource,
        diagnostics: &mut Diagnostics,
    ) -> Result<FitOutcome> {
        let solver = self.solver.clone();
        self.fit_with(&solver, data, axes, diagnostics)
    }

    /// Fit the configured function with `solver`.
    ///
    /// On success the parameter values and the result are replaced together.
    /// On error neither is touched; the reason is also pushed to
    /// `diagnostics`. A solver that stops without converging is not an
    /// error: its parameters are used and a warning is recorded.
    pub fn fit_with<S: CurveSolver + ?Sized>(
        &mut self,
        solver: &S,
        data: &dyn DataSource,
        axes: &dyn AxisSource,
        diagnostics: &mut Diagnostics,
    ) -> Result<FitOutcome> {
        let settings = &self.settings;
        let (names, initial) = settings.values.initial_vector();
        let observations = prepare(settings, data, axes, names.len(), diagnostics)?;

        let model = ExpressionModel::new(
            &settings.function,
            settings.variable.name(),
            &settings.values,
            &names,
        );
        if let Err(err) = model.validate() {
            diagnostics.warn(
                FitStage::Solving,
                format!("Cannot evaluate '{}': {}", settings.function, err),
            );
        }

        let output = solver
            .solve(
                &model,
                &initial,
                &observations.x,
                &observations.y,
                &observations.yerr,
            )
            .map_err(|err| {
                diagnostics.error(FitStage::Solving, err.to_string());
                err
            })?;

        if !output.converged {
            diagnostics.warn(
                FitStage::Solving,
                format!("Fit did not converge: {}", output.message),
            );
        }
        if output.undefined_points > 0 && output.undefined_points < observations.len() {
            diagnostics.warn(
                FitStage::Solving,
                format!(
                    "{} of {} points could not be evaluated and were left out of chi-square",
                    output.undefined_points,
                    observations.len()
                ),
            );
        }
        if !output.chi2.is_finite() {
            diagnostics.warn(
                FitStage::Solving,
                format!("Chi-square is not finite ({})", output.chi2),
            );
        }

        let values = settings
            .values
            .with_values(&names, &output.params)
            .map_err(|err| {
                let err = FitError::from(err);
                diagnostics.error(FitStage::Summarizing, err.to_string());
                err
            })?;

        let redchi2 = reduced_chi_square(output.chi2, output.dof).unwrap_or_else(|| {
            diagnostics.info(FitStage::Summarizing, "No degrees of freedom in fit.");
            -1.0
        });

        let (independent_name, _) = settings.data_roles();
        let out_expr = render(
            &settings.function,
            &values,
            settings.variable,
            independent_name,
        );

        let result = FitResult {
            chi2: output.chi2,
            dof: output.dof,
            redchi2,
            out_expr,
        };

        self.settings.values = values;
        self.result = result.clone();

        Ok(FitOutcome {
            result,
            converged: output.converged,
            iterations: output.iterations,
            message: output.message,
        })
    }

    /// Evaluate the function with the current parameter values.
    ///
    /// Points that cannot be evaluated are NaN; if the function does not
    /// parse, every point is.
    pub fn evaluate(&self, x: &Array1<f64>) -> Array1<f64> {
        let settings = &self.settings;
        let model = ExpressionModel::for_parameters(
            &settings.function,
            settings.variable.name(),
            &settings.values,
        );
        let (_, values) = settings.values.initial_vector();
        model.eval(&values, x)
    }

    /// Widen `bounds` of `axis` to include the data plotted on it.
    ///
    /// Axes other than the configured x and y axes, and datasets that do not
    /// exist or have no finite values, leave the bounds as they are.
    pub fn auto_axis(&self, axis: &str, bounds: (f64, f64), data: &dyn DataSource) -> (f64, f64) {
        let settings = &self.settings;
        let dataset_name = if axis == settings.x_axis {
            &settings.x_data
        } else if axis == settings.y_axis {
            &settings.y_data
        } else {
            return bounds;
        };

        if !data.has_data(dataset_name) {
            return bounds;
        }
        match data.get_data(dataset_name).and_then(|dataset| dataset.range()) {
            Some((min, max)) => (bounds.0.min(min), bounds.1.max(max)),
            None => bounds,
        }
    }

    /// Render the function with the current parameter values and store it
    /// as the result's output expression.
    pub fn generate_output_expression(&mut self) -> &str {
        let settings = &self.settings;
        let (independent_name, _) = settings.data_roles();
        self.result.out_expr = render(
            &settings.function,
            &settings.values,
            settings.variable,
            independent_name,
        );
        &self.result.out_expr
    }
}
