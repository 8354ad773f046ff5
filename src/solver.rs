//! The boundary between the fit driver and the numerical optimizer.
//!
//! A [`CurveSolver`] takes a model `f(params, x)`, an initial parameter
//! vector and the cleaned observations, and returns the refined parameters
//! together with the chi-square and degrees of freedom of the fit.

use ndarray::Array1;

use crate::error::Result;
use crate::lm::LevenbergMarquardt;
use crate::model::ModelFunction;
use crate::problem::CurveProblem;

/// Output of a curve solver run.
#[derive(Debug, Clone)]
pub struct SolverOutput {
    /// Refined parameter vector, positionally aligned with the initial one
    pub params: Array1<f64>,

    /// Sum of squared error-weighted residuals at `params`, over the points
    /// where the model is defined
    pub chi2: f64,

    /// Points where the model could not be evaluated at `params`
    pub undefined_points: usize,

    /// Number of points minus number of parameters
    pub dof: i64,

    /// Whether the solver met one of its convergence criteria
    pub converged: bool,

    /// Number of accepted iterations
    pub iterations: usize,

    /// Human-readable termination reason
    pub message: String,
}

/// A least-squares solver for `y ≈ model(params, x)` weighted by `1 / yerr`.
pub trait CurveSolver {
    /// Fit `model` to the observations starting from `initial`.
    ///
    /// Non-convergence is reported through [`SolverOutput::converged`];
    /// an `Err` means the problem could not be evaluated at all.
    fn solve(
        &self,
        model: &dyn ModelFunction,
        initial: &Array1<f64>,
        x: &Array1<f64>,
        y: &Array1<f64>,
        yerr: &Array1<f64>,
    ) -> Result<SolverOutput>;
}

/// Degrees of freedom of a fit of `parameters` parameters to `points` points.
pub fn degrees_of_freedom(points: usize, parameters: usize) -> i64 {
    points as i64 - parameters as i64
}

impl CurveSolver for LevenbergMarquardt {
    fn solve(
        &self,
        model: &dyn ModelFunction,
        initial: &Array1<f64>,
        x: &Array1<f64>,
        y: &Array1<f64>,
        yerr: &Array1<f64>,
    ) -> Result<SolverOutput> {
        let problem = CurveProblem::new(model, initial.len(), x, y, yerr)?;
        let result = self.minimize(&problem, initial.clone())?;

        log::debug!(
            "solver finished after {} iterations ({} evaluations): {}",
            result.iterations,
            result.func_evals,
            result.message
        );

        Ok(SolverOutput {
            params: result.params,
            chi2: result.cost,
            undefined_points: result.undefined_residuals,
            dof: degrees_of_freedom(y.len(), initial.len()),
            converged: result.success,
            iterations: result.iterations,
            message: result.message,
        })
    }
}
