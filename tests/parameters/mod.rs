//! Integration tests for the parameter system
//!
//! These tests verify that the parameter system behaves correctly in various scenarios.

// Tests for the ParameterSet collection
mod parameters_tests;

// Tests for the Expression parsing, evaluation and compilation
mod expression_tests;
