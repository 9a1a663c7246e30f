//! Closed-form estimator: the noise-free expectation of the synthetic generator.

use crate::data::baseline_price;
use crate::domain::{Category, EstimatorKind, Location, PriceQuery};
use crate::error::PricingError;
use crate::estimator::FairPriceEstimator;

/// Base rate × location factor with complexity, material and area adjustments.
///
/// Needs no training. Unknown labels alias to the first table entry
/// (Masonry / Colombo), mirroring the code-0 fallback of trained mappings.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaEstimator;

impl FormulaEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl FairPriceEstimator for FormulaEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Formula
    }

    fn estimate(&self, query: &PriceQuery) -> Result<f64, PricingError> {
        let category = Category::from_label(&query.category).unwrap_or(Category::ALL[0]);
        let location = Location::from_label(&query.location).unwrap_or(Location::ALL[0]);
        let price = baseline_price(
            category,
            location,
            query.area_sqm,
            query.complexity_score,
            query.material_quality_score,
        );
        Ok(price.max(0.0))
    }

    fn known_categories(&self) -> Vec<String> {
        Category::ALL.iter().map(|c| c.display_name().to_string()).collect()
    }

    fn known_locations(&self) -> Vec<String> {
        Location::ALL.iter().map(|l| l.display_name().to_string()).collect()
    }
}
