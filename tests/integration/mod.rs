//! Integration tests for the exprfit library
//!
//! This module organizes all integration tests that test the library as a whole,
//! rather than individual components.

// Real-world fitting problems
pub mod real_world;
