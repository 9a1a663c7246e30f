//! Domain types used throughout the estimator.
//!
//! This module defines:
//!
//! - the reference tables (`Category`, `Location`, `Province`)
//! - estimation inputs (`PriceQuery`) and training rows (`TrainingSample`)
//! - training/evaluation outputs (`TrainingHistory`, `EvaluationMetrics`)

pub mod types;

pub use types::*;
