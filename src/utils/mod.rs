//! Numerical helpers used by the optimizer.

pub mod finite_difference;
