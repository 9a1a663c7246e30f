//! `fair-price` library crate.
//!
//! The binary (`fairprice`) is a thin wrapper around this library so that:
//!
//! - estimation and analysis logic is testable without spawning processes
//! - the estimator strategies can be embedded in other services
//! - code stays easy to navigate as the project grows

pub mod analysis;
pub mod analyzer;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod estimator;
pub mod features;
pub mod io;
pub mod market;
pub mod math;
pub mod models;
pub mod report;
pub mod telemetry;

pub use analyzer::PriceAnalyzer;
pub use estimator::{FairPriceEstimator, FormulaEstimator, SharedEstimator, TrainedEstimator};
