//! # Parameter System
//!
//! Named parameter values and the expression language they are used in.
//!
//! - [`ParameterSet`]: parameter names mapped to values, with a fixed
//!   lexicographic order for laying them out as solver vectors
//! - [`Expression`]: parse fit functions such as `a + b*x`, evaluate them by
//!   name or compile them for repeated evaluation from a value slice
//!
//! ## Example Usage
//!
//! ```rust
//! use exprfit::parameters::{Expression, ParameterSet};
//!
//! let params = ParameterSet::from_pairs([("a", 1.0), ("b", 2.0)]).unwrap();
//! let expr = Expression::parse("a + b * 3").unwrap();
//! assert_eq!(expr.evaluate(&params).unwrap(), 7.0);
//!
//! // Solver vectors always follow the sorted name order
//! let (names, values) = params.initial_vector();
//! assert_eq!(names, vec!["a", "b"]);
//! assert_eq!(values.to_vec(), vec![1.0, 2.0]);
//! ```

pub mod expression;
pub mod parameters;

// Include tests
#[cfg(test)]
mod tests;

// Re-export key types
pub use expression::{
    Builtin, CompiledExpression, EvaluationContext, Expression, ExpressionError, SimpleContext,
};
pub use parameters::{is_valid_name, ParameterError, ParameterSet};
