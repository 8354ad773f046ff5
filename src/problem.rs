//! Problem definition trait and implementations.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem to be solved with the Levenberg-Marquardt algorithm,
//! and [`CurveProblem`], the error-weighted residuals of a model against
//! observed data.

use crate::error::{FitError, Result};
use crate::model::ModelFunction;
use ndarray::{Array1, Array2};

/// A trait representing a nonlinear least squares problem.
///
/// This trait defines the interface for problems that can be solved using
/// the Levenberg-Marquardt algorithm.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// Residuals may be non-finite; the optimizer treats such a point as
    /// worse than any finite one.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

/// Residuals `(y - f(params, x)) / yerr` of a model against observations.
///
/// The cost of this problem is the chi-square of the fit.
pub struct CurveProblem<'a, M: ModelFunction + ?Sized> {
    model: &'a M,
    x: &'a Array1<f64>,
    y: &'a Array1<f64>,
    yerr: &'a Array1<f64>,
    parameter_count: usize,
}

impl<'a, M: ModelFunction + ?Sized> CurveProblem<'a, M> {
    /// Create the problem, checking that the observation arrays agree in length.
    pub fn new(
        model: &'a M,
        parameter_count: usize,
        x: &'a Array1<f64>,
        y: &'a Array1<f64>,
        yerr: &'a Array1<f64>,
    ) -> Result<Self> {
        if x.len() != y.len() || x.len() != yerr.len() {
            return Err(FitError::DimensionMismatch(format!(
                "x, y and yerr lengths differ: {}, {}, {}",
                x.len(),
                y.len(),
                yerr.len()
            )));
        }
        Ok(Self {
            model,
            x,
            y,
            yerr,
            parameter_count,
        })
    }
}

impl<'a, M: ModelFunction + ?Sized> Problem for CurveProblem<'a, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != self.parameter_count {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                self.parameter_count,
                params.len()
            )));
        }

        let predicted = self.model.eval(params, self.x);
        if predicted.len() != self.y.len() {
            return Err(FitError::DimensionMismatch(format!(
                "Model returned {} values for {} points",
                predicted.len(),
                self.y.len()
            )));
        }

        Ok((self.y - &predicted) / self.yerr)
    }

    fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    fn residual_count(&self) -> usize {
        self.y.len()
    }
}
