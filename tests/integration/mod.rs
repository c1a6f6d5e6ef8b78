//! tests/integration/mod.rs
//!
//! Scenario tests for the membership protocol, grouped by theme.

mod convergence;
mod failure;
mod join;
