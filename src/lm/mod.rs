//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides the nonlinear least-squares optimizer used to fit
//! expressions to data. It works on any [`Problem`](crate::problem::Problem)
//! and is configurable through [`LmConfig`].

pub mod algorithm;
pub mod config;
pub mod convergence;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
