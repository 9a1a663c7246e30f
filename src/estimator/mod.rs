//! The fair-price estimation interface and its strategies.
//!
//! - `FormulaEstimator`: closed-form price from the reference tables
//! - `TrainedEstimator`: feature mapping + scaler + fitted regressor
//! - `SharedEstimator`: a `TrainedEstimator` behind a read/write lock
//!
//! Analysis code (regional fan-out, disputes, benchmarks) is written against
//! `FairPriceEstimator` only, so the strategies are interchangeable.

pub mod formula;
pub mod shared;
pub mod trained;

pub use formula::FormulaEstimator;
pub use shared::SharedEstimator;
pub use trained::TrainedEstimator;

use crate::domain::{EstimatorKind, PriceQuery};
use crate::error::PricingError;

pub trait FairPriceEstimator: Send + Sync {
    fn kind(&self) -> EstimatorKind;

    /// Point estimate of a fair price in LKR. Never negative.
    fn estimate(&self, query: &PriceQuery) -> Result<f64, PricingError>;

    /// Category labels this estimator can tell apart, in code order.
    fn known_categories(&self) -> Vec<String>;

    /// Location labels this estimator can tell apart, in code order.
    fn known_locations(&self) -> Vec<String>;
}

impl<E: FairPriceEstimator + ?Sized> FairPriceEstimator for Box<E> {
    fn kind(&self) -> EstimatorKind {
        (**self).kind()
    }

    fn estimate(&self, query: &PriceQuery) -> Result<f64, PricingError> {
        (**self).estimate(query)
    }

    fn known_categories(&self) -> Vec<String> {
        (**self).known_categories()
    }

    fn known_locations(&self) -> Vec<String> {
        (**self).known_locations()
    }
}
