//! Numerical utilities: least squares solvers and summary statistics.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
