//! Convergence criteria for the optimizer.
//!
//! This module defines the criteria used to determine when the
//! Levenberg-Marquardt loop has converged or has to give up.

use ndarray::Array1;

use super::config::LmConfig;

/// Possible convergence states for the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The algorithm is still running.
    Running,

    /// The algorithm has converged due to a small parameter change.
    ParameterConvergence,

    /// The algorithm has converged due to a small function value change.
    FunctionValueConvergence,

    /// The algorithm has converged due to a small gradient.
    GradientConvergence,

    /// The algorithm has terminated due to reaching the maximum number of iterations.
    MaxIterationsReached,

    /// No step reduced the cost before the damping reached its maximum.
    StepFailure,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has terminated (either converged or failed).
    pub fn is_terminated(&self) -> bool {
        !matches!(self, ConvergenceStatus::Running)
    }

    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::GradientConvergence
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::Running => "Optimization is still running",
            ConvergenceStatus::ParameterConvergence => "Converged: small parameter change",
            ConvergenceStatus::FunctionValueConvergence => {
                "Converged: small function value change"
            }
            ConvergenceStatus::GradientConvergence => "Converged: small gradient",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
            ConvergenceStatus::StepFailure => {
                "Terminated: failed to decrease cost, and lambda reached maximum"
            }
        }
    }
}

/// Criteria for determining when the optimizer has converged.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Tolerance for relative change in parameter values.
    pub xtol: f64,

    /// Tolerance for relative change in function value.
    pub ftol: f64,

    /// Tolerance for gradient norm.
    pub gtol: f64,

    /// Maximum number of iterations.
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self::from(&LmConfig::default())
    }
}

impl From<&LmConfig> for ConvergenceCriteria {
    fn from(config: &LmConfig) -> Self {
        Self::new(config.xtol, config.ftol, config.gtol, config.max_iterations)
    }
}

impl ConvergenceCriteria {
    /// Creates a new set of convergence criteria with the given tolerances.
    pub fn new(xtol: f64, ftol: f64, gtol: f64, max_iterations: usize) -> Self {
        Self {
            xtol,
            ftol,
            gtol,
            max_iterations,
        }
    }

    /// Largest change between `params` and `new_params`, relative to the
    /// parameter magnitude (or absolute for parameters smaller than one).
    pub fn relative_change(params: &Array1<f64>, new_params: &Array1<f64>) -> f64 {
        new_params
            .iter()
            .zip(params.iter())
            .map(|(a, b)| (a - b).abs() / b.abs().max(1.0))
            .fold(0.0, |acc, change| {
                // f64::max would drop a NaN change
                if acc.is_nan() || change.is_nan() {
                    f64::NAN
                } else {
                    acc.max(change)
                }
            })
    }

    /// Whether a step of this relative size is too small to matter.
    pub fn step_negligible(&self, params: &Array1<f64>, new_params: &Array1<f64>) -> bool {
        let change = Self::relative_change(params, new_params);
        change.is_finite() && change < self.xtol
    }

    /// Checks whether the optimization has converged after an accepted step.
    ///
    /// A non-finite `cost` never counts as converged.
    pub fn check(
        &self,
        params: &Array1<f64>,
        new_params: &Array1<f64>,
        cost: f64,
        new_cost: f64,
        gradient_norm: f64,
        iterations: usize,
    ) -> ConvergenceStatus {
        if iterations >= self.max_iterations {
            return ConvergenceStatus::MaxIterationsReached;
        }

        if gradient_norm < self.gtol {
            return ConvergenceStatus::GradientConvergence;
        }

        if self.step_negligible(params, new_params) {
            return ConvergenceStatus::ParameterConvergence;
        }

        if cost.is_finite() {
            let cost_change = (cost - new_cost).abs() / cost.max(1e-10);
            if cost_change < self.ftol {
                return ConvergenceStatus::FunctionValueConvergence;
            }
        }

        ConvergenceStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_convergence_criteria() {
        let criteria = ConvergenceCriteria::default();

        // Test parameter convergence
        let params = array![1.0, 2.0, 3.0];
        let new_params = array![1.000000001, 2.000000001, 3.000000001];
        let status = criteria.check(&params, &new_params, 10.0, 9.9, 0.1, 50);
        assert_eq!(status, ConvergenceStatus::ParameterConvergence);

        // Test function value convergence
        let params = array![1.0, 2.0, 3.0];
        let new_params = array![1.1, 2.1, 3.1];
        let status = criteria.check(&params, &new_params, 10.0, 9.9999999999, 0.1, 50);
        assert_eq!(status, ConvergenceStatus::FunctionValueConvergence);

        // Test gradient convergence
        let status = criteria.check(&params, &new_params, 10.0, 9.0, 1e-9, 50);
        assert_eq!(status, ConvergenceStatus::GradientConvergence);

        // Test max iterations
        let status = criteria.check(&params, &new_params, 10.0, 9.0, 0.1, 100);
        assert_eq!(status, ConvergenceStatus::MaxIterationsReached);

        // Test still running
        let status = criteria.check(&params, &new_params, 10.0, 9.0, 0.1, 50);
        assert_eq!(status, ConvergenceStatus::Running);
    }

    #[test]
    fn test_non_finite_cost_keeps_running() {
        let criteria = ConvergenceCriteria::default();
        let params = array![1.0];
        let new_params = array![2.0];
        let status = criteria.check(&params, &new_params, f64::NAN, 5.0, f64::NAN, 1);
        assert_eq!(status, ConvergenceStatus::Running);

        let nan_params = array![f64::NAN];
        assert!(!criteria.step_negligible(&params, &nan_params));
    }

    #[test]
    fn test_convergence_status_methods() {
        assert!(!ConvergenceStatus::Running.is_terminated());
        assert!(ConvergenceStatus::ParameterConvergence.is_terminated());
        assert!(ConvergenceStatus::StepFailure.is_terminated());
        assert!(ConvergenceStatus::MaxIterationsReached.is_terminated());

        assert!(!ConvergenceStatus::Running.is_converged());
        assert!(ConvergenceStatus::ParameterConvergence.is_converged());
        assert!(ConvergenceStatus::FunctionValueConvergence.is_converged());
        assert!(ConvergenceStatus::GradientConvergence.is_converged());
        assert!(!ConvergenceStatus::MaxIterationsReached.is_converged());
        assert!(!ConvergenceStatus::StepFailure.is_converged());
    }
}
