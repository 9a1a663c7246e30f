//! Category × location price grid for a reference job.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{CURRENCY, PriceQuery};
use crate::error::PricingError;
use crate::estimator::FairPriceEstimator;

pub const BENCHMARK_AREA_SQM: f64 = 100.0;
pub const BENCHMARK_SCORE: f64 = 5.0;

/// Reference job priced in every cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkJob {
    pub area_sqm: f64,
    pub complexity_score: f64,
    pub material_quality_score: f64,
}

impl Default for BenchmarkJob {
    fn default() -> Self {
        Self {
            area_sqm: BENCHMARK_AREA_SQM,
            complexity_score: BENCHMARK_SCORE,
            material_quality_score: BENCHMARK_SCORE,
        }
    }
}

/// Pivot table: one row per category, one column per location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub job: BenchmarkJob,
    pub categories: Vec<String>,
    pub locations: Vec<String>,
    /// `prices[i][j]` is `categories[i]` in `locations[j]`.
    pub prices: Vec<Vec<f64>>,
    pub currency: String,
}

impl BenchmarkReport {
    pub fn price(&self, category: &str, location: &str) -> Option<f64> {
        let i = self.categories.iter().position(|c| c == category)?;
        let j = self.locations.iter().position(|l| l == location)?;
        self.prices.get(i)?.get(j).copied()
    }
}

/// Price `job` for each category (default: every known one) in every known location.
pub fn benchmark_report<E: FairPriceEstimator + ?Sized>(
    estimator: &E,
    categories: Option<&[String]>,
    job: BenchmarkJob,
) -> Result<BenchmarkReport, PricingError> {
    let categories = match categories {
        Some(list) => list.to_vec(),
        None => estimator.known_categories(),
    };
    let locations = estimator.known_locations();
    if categories.is_empty() || locations.is_empty() {
        return Err(PricingError::invalid_state(
            "benchmark needs at least one category and one location; train or load a model first",
        ));
    }

    let prices = categories
        .par_iter()
        .map(|category| {
            locations
                .iter()
                .map(|location| {
                    estimator.estimate(&PriceQuery::new(
                        category.as_str(),
                        location.as_str(),
                        job.area_sqm,
                        job.complexity_score,
                        job.material_quality_score,
                    ))
                })
                .collect::<Result<Vec<f64>, PricingError>>()
        })
        .collect::<Result<Vec<_>, PricingError>>()?;

    Ok(BenchmarkReport {
        job,
        categories,
        locations,
        prices,
        currency: CURRENCY.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Location};
    use crate::estimator::{FormulaEstimator, TrainedEstimator};

    #[test]
    fn full_grid_from_known_labels() {
        let report = benchmark_report(&FormulaEstimator::new(), None, BenchmarkJob::default()).unwrap();
        assert_eq!(report.categories.len(), Category::ALL.len());
        assert_eq!(report.locations.len(), Location::ALL.len());
        assert!(report.prices.iter().all(|row| row.len() == Location::ALL.len()));

        let direct = FormulaEstimator::new()
            .estimate(&PriceQuery::new("HVAC", "Galle", 100.0, 5.0, 5.0))
            .unwrap();
        assert_eq!(report.price("HVAC", "Galle"), Some(direct));
        assert_eq!(report.price("HVAC", "Atlantis"), None);
    }

    #[test]
    fn explicit_category_subset() {
        let subset = vec!["Plumbing".to_string(), "Bogus".to_string()];
        let report = benchmark_report(&FormulaEstimator::new(), Some(&subset), BenchmarkJob::default()).unwrap();
        assert_eq!(report.prices.len(), 2);
        // Unknown trades price like the first table entry.
        let masonry = FormulaEstimator::new()
            .estimate(&PriceQuery::new("Masonry", "Colombo", 100.0, 5.0, 5.0))
            .unwrap();
        assert_eq!(report.price("Bogus", "Colombo"), Some(masonry));
    }

    #[test]
    fn untrained_estimator_is_invalid_state() {
        let err = benchmark_report(&TrainedEstimator::new(), None, BenchmarkJob::default()).unwrap_err();
        assert!(matches!(err, PricingError::InvalidState(_)));
    }
}
