//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! Each iteration solves the damped normal equations
//! `(J^T J + λI) δ = -J^T r` by Cholesky decomposition. Residuals that are
//! not finite (a model undefined at some point) are left out of the cost, the
//! gradient and `J^T J`. A step is accepted if it leaves fewer residuals
//! undefined, or the same number with a lower cost; otherwise λ grows and the
//! step is retried.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{FitError, Result};
use crate::problem::Problem;

use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared finite residuals, NaN if none is finite
    pub cost: f64,

    /// Number of residuals that were not finite at the solution
    pub undefined_residuals: usize,

    /// Number of accepted iterations
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization converged
    pub success: bool,

    /// Why the optimization stopped
    pub status: ConvergenceStatus,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Undefined residuals: {}", self.undefined_residuals)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for relative change in the cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the maximum value for lambda.
    pub fn with_max_lambda(mut self, max_lambda: f64) -> Self {
        self.config.max_lambda = max_lambda;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Non-convergence is not an error: the returned [`LmResult`] carries the
    /// best parameters found with `success == false`. Errors are reserved for
    /// problems that cannot be evaluated at all (e.g. dimension mismatches).
    pub fn minimize<P: Problem>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
    ) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let criteria = ConvergenceCriteria::from(&self.config);
        let mut params = initial_params;
        let mut lambda = self.config.initial_lambda;

        let mut residuals = problem.eval(&params)?;
        let mut cost = Cost::of(&residuals);
        let mut func_evals = 1;
        let mut iterations = 0;

        let status = 'outer: loop {
            if cost.nothing_defined(residuals.len()) {
                break ConvergenceStatus::StepFailure;
            }

            let jacobian = problem.jacobian(&params)?.mapv(finite_or_zero);
            func_evals += n_params + 1;

            // Gradient of the cost (up to a factor of 2)
            let gradient = jacobian.t().dot(&residuals.mapv(finite_or_zero));
            let gradient_norm = gradient.dot(&gradient).sqrt();
            if cost.sum.is_finite() && gradient_norm < self.config.gtol {
                break ConvergenceStatus::GradientConvergence;
            }

            let jtj = jacobian.t().dot(&jacobian);

            loop {
                if let Some(step) = damped_step(&jtj, &gradient, lambda) {
                    let new_params = &params + &step;
                    let new_residuals = problem.eval(&new_params)?;
                    func_evals += 1;
                    let new_cost = Cost::of(&new_residuals);

                    if new_cost.improves_on(&cost) {
                        iterations += 1;
                        // Costs over different sets of points are not comparable
                        let status = if new_cost.undefined == cost.undefined {
                            criteria.check(
                                &params,
                                &new_params,
                                cost.sum,
                                new_cost.sum,
                                gradient_norm,
                                iterations,
                            )
                        } else if iterations >= self.config.max_iterations {
                            ConvergenceStatus::MaxIterationsReached
                        } else {
                            ConvergenceStatus::Running
                        };

                        params = new_params;
                        residuals = new_residuals;
                        cost = new_cost;
                        lambda =
                            (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);

                        if status.is_terminated() {
                            break 'outer status;
                        }
                        continue 'outer;
                    }

                    // Damping has shrunk the step to nothing: we are at the minimum
                    if cost.sum.is_finite() && criteria.step_negligible(&params, &new_params) {
                        break 'outer ConvergenceStatus::ParameterConvergence;
                    }
                }

                if lambda >= self.config.max_lambda {
                    break 'outer ConvergenceStatus::StepFailure;
                }
                lambda = (lambda * self.config.lambda_up_factor).min(self.config.max_lambda);
            }
        };

        if cost.undefined > 0 {
            log::debug!(
                "{} of {} residuals undefined at the solution",
                cost.undefined,
                residuals.len()
            );
        }

        Ok(LmResult {
            cost: if cost.nothing_defined(residuals.len()) {
                f64::NAN
            } else {
                cost.sum
            },
            undefined_residuals: cost.undefined,
            params,
            residuals,
            iterations,
            func_evals,
            success: status.is_converged(),
            status,
            message: status.description().to_string(),
        })
    }
}

/// Sum of squares over the finite residuals, and how many were left out.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cost {
    sum: f64,
    undefined: usize,
}

impl Cost {
    fn of(residuals: &Array1<f64>) -> Self {
        residuals.iter().fold(
            Cost {
                sum: 0.0,
                undefined: 0,
            },
            |acc, r| {
                if r.is_finite() {
                    Cost {
                        sum: acc.sum + r * r,
                        ..acc
                    }
                } else {
                    Cost {
                        undefined: acc.undefined + 1,
                        ..acc
                    }
                }
            },
        )
    }

    fn nothing_defined(&self, residual_count: usize) -> bool {
        residual_count > 0 && self.undefined == residual_count
    }

    /// Fewer undefined residuals wins; with as many, the lower finite sum does.
    fn improves_on(&self, current: &Cost) -> bool {
        self.sum.is_finite()
            && (self.undefined < current.undefined
                || (self.undefined == current.undefined && self.sum < current.sum))
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Solve `(J^T J + λI) δ = -g`. Returns `None` if the damped matrix is not
/// positive definite (which includes non-finite entries).
fn damped_step(jtj: &Array2<f64>, gradient: &Array1<f64>, lambda: f64) -> Option<Array1<f64>> {
    let mut a = jtj.clone();
    a.diag_mut().mapv_inplace(|d| d + lambda);
    cholesky_solve(&a, &gradient.mapv(|g| -g))
}

/// Solve `A x = b` for symmetric positive definite `A` with nalgebra's
/// Cholesky factorization.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    if !a.iter().all(|v| v.is_finite()) {
        return None;
    }

    let n = a.nrows();
    let matrix = DMatrix::from_fn(n, n, |i, j| a[[i, j]]);
    let rhs = DVector::from_iterator(n, b.iter().copied());

    let solution = matrix.cholesky()?.solve(&rhs);
    if solution.iter().all(|v| v.is_finite()) {
        Some(solution.iter().copied().collect())
    } else {
        None
    }
}
