//! Model functions evaluated by the solver.
//!
//! A [`ModelFunction`] maps a parameter vector and an array of independent
//! values to predicted dependent values. [`ExpressionModel`] is the model
//! built from a user-written fit function: the expression is parsed and
//! compiled once, then evaluated point by point for every trial parameter
//! vector the solver proposes.
//!
//! Evaluation never fails. A point whose evaluation errors (division by zero,
//! unknown name, wrong vector length, ...) yields NaN, and points where the
//! arithmetic itself produces NaN (e.g. `log` of a negative number) stay NaN.
//! The solver leaves points with non-finite predictions out of the cost and
//! rejects steps that leave more points undefined.

use crate::error::{FitError, Result};
use crate::parameters::expression::{CompiledExpression, Expression, ExpressionError};
use crate::parameters::ParameterSet;
use ndarray::Array1;

/// A model `y = f(params, x)` evaluated over an array of `x` values.
pub trait ModelFunction {
    /// Predicted values at `x` for the given parameter vector. The output has
    /// the same length as `x`.
    fn eval(&self, params: &Array1<f64>, x: &Array1<f64>) -> Array1<f64>;
}

impl<F> ModelFunction for F
where
    F: Fn(&Array1<f64>, &Array1<f64>) -> Array1<f64>,
{
    fn eval(&self, params: &Array1<f64>, x: &Array1<f64>) -> Array1<f64> {
        self(params, x)
    }
}

/// The evaluator for a user-written fit function.
///
/// Slots are laid out as: varied parameters (in the order of the solver
/// vector), then the independent variable, then the remaining parameters
/// with their stored values. Because the compiled expression binds each name
/// to its first slot, a varied parameter shadows the independent variable,
/// which in turn shadows a static parameter of the same name.
#[derive(Debug, Clone)]
pub struct ExpressionModel {
    compiled: std::result::Result<CompiledExpression, ExpressionError>,
    varying: Vec<String>,
    /// Slot values for the static parameters, after the variable slot
    static_values: Vec<f64>,
}

impl ExpressionModel {
    /// Build the evaluator for `function` with `variable` bound to the
    /// independent values and `varying` bound, in order, to the solver's
    /// parameter vector.
    ///
    /// A function that fails to parse or to compile is not an error here;
    /// the model then evaluates to NaN everywhere and
    /// [`ExpressionModel::validate`] reports why.
    pub fn new(function: &str, variable: &str, params: &ParameterSet, varying: &[String]) -> Self {
        let statics: Vec<(String, f64)> = params
            .iter_sorted()
            .filter(|(name, _)| !varying.contains(name))
            .collect();

        let mut slots: Vec<&str> = varying.iter().map(String::as_str).collect();
        slots.push(variable);
        slots.extend(statics.iter().map(|(name, _)| name.as_str()));

        let compiled = Expression::parse(function).and_then(|expr| expr.compile(&slots));
        if let Err(err) = &compiled {
            log::debug!("fit function '{}' unusable: {}", function, err);
        }

        Self {
            compiled,
            varying: varying.to_vec(),
            static_values: statics.into_iter().map(|(_, value)| value).collect(),
        }
    }

    /// Build the evaluator with every parameter in `params` varied, in the
    /// canonical sorted order.
    pub fn for_parameters(function: &str, variable: &str, params: &ParameterSet) -> Self {
        Self::new(function, variable, params, &params.sorted_names())
    }

    /// Names bound to the solver's parameter vector, in vector order.
    pub fn varying(&self) -> &[String] {
        &self.varying
    }

    /// Whether the function compiled; if not, the reason.
    pub fn validate(&self) -> Result<()> {
        match &self.compiled {
            Ok(_) => Ok(()),
            Err(err) => Err(FitError::Expression(err.clone())),
        }
    }

    /// Evaluate at a single independent value.
    fn eval_point(&self, compiled: &CompiledExpression, slots: &mut [f64], x: f64) -> f64 {
        slots[self.varying.len()] = x;
        compiled.eval(slots).unwrap_or(f64::NAN)
    }
}

impl ModelFunction for ExpressionModel {
    fn eval(&self, params: &Array1<f64>, x: &Array1<f64>) -> Array1<f64> {
        let compiled = match &self.compiled {
            Ok(compiled) => compiled,
            Err(_) => return Array1::from_elem(x.len(), f64::NAN),
        };
        if params.len() != self.varying.len() {
            return Array1::from_elem(x.len(), f64::NAN);
        }

        let mut slots = Vec::with_capacity(compiled.slot_count());
        slots.extend(params.iter().copied());
        slots.push(0.0);
        slots.extend(self.static_values.iter().copied());

        x.mapv(|xi| self.eval_point(compiled, &mut slots, xi))
    }
}
