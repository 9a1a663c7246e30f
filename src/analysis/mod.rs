//! Analyses built on top of any `FairPriceEstimator`.
//!
//! - `regional`: one job priced across every known district
//! - `dispute`: contractor quote vs. client expectation
//! - `benchmark`: category × location price grid

pub mod benchmark;
pub mod dispute;
pub mod regional;

pub use benchmark::*;
pub use dispute::*;
pub use regional::*;
