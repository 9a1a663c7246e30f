//! `PriceAnalyzer`: one handle over an estimator, dispute thresholds and the
//! random source used for market jitter and synthetic data.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::analysis::{
    BenchmarkJob, BenchmarkReport, DisputeRequest, DisputeResult, DisputeThresholds, RegionalReport,
};
use crate::config::{FineTuneConfig, TrainingConfig};
use crate::domain::{EvaluationMetrics, PriceQuery, TrainingHistory, TrainingSample};
use crate::error::PricingError;
use crate::estimator::{FairPriceEstimator, TrainedEstimator};
use crate::market::MarketRateInfo;

pub struct PriceAnalyzer<E> {
    estimator: E,
    thresholds: DisputeThresholds,
    rng: StdRng,
}

impl<E: FairPriceEstimator> PriceAnalyzer<E> {
    /// Analyzer with default thresholds and an entropy-seeded RNG.
    pub fn new(estimator: E) -> Self {
        Self {
            estimator,
            thresholds: DisputeThresholds::default(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible market jitter and data generation.
    pub fn with_seed(estimator: E, seed: u64) -> Self {
        Self {
            estimator,
            thresholds: DisputeThresholds::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_thresholds(mut self, thresholds: DisputeThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn thresholds(&self) -> &DisputeThresholds {
        &self.thresholds
    }

    pub fn estimate(
        &self,
        category: &str,
        location: &str,
        area_sqm: f64,
        complexity_score: f64,
        material_quality_score: f64,
    ) -> Result<f64, PricingError> {
        self.estimator.estimate(&PriceQuery::new(
            category,
            location,
            area_sqm,
            complexity_score,
            material_quality_score,
        ))
    }

    pub fn get_market_rates(&mut self, category: &str, location: &str) -> MarketRateInfo {
        crate::market::market_rates(category, location, &mut self.rng)
    }

    pub fn analyze_regional_pricing(
        &self,
        category: &str,
        area_sqm: f64,
        complexity_score: f64,
        material_quality_score: f64,
    ) -> Result<RegionalReport, PricingError> {
        crate::analysis::analyze_regional_pricing(
            &self.estimator,
            category,
            area_sqm,
            complexity_score,
            material_quality_score,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn evaluate_dispute(
        &mut self,
        category: &str,
        location: &str,
        area_sqm: f64,
        complexity_score: f64,
        material_quality_score: f64,
        contractor_price: f64,
        client_expectation: Option<f64>,
    ) -> Result<DisputeResult, PricingError> {
        let request = DisputeRequest {
            query: PriceQuery::new(category, location, area_sqm, complexity_score, material_quality_score),
            contractor_price,
            client_expectation,
        };
        crate::analysis::evaluate_dispute(&self.estimator, &request, &self.thresholds, &mut self.rng)
    }

    pub fn generate_training_data(&mut self, count: usize) -> Vec<TrainingSample> {
        crate::data::generate_training_data(count, &mut self.rng)
    }

    pub fn benchmark_report(
        &self,
        categories: Option<&[String]>,
        job: BenchmarkJob,
    ) -> Result<BenchmarkReport, PricingError> {
        crate::analysis::benchmark_report(&self.estimator, categories, job)
    }
}

impl PriceAnalyzer<TrainedEstimator> {
    pub fn train(&mut self, samples: &[TrainingSample], config: &TrainingConfig) -> Result<TrainingHistory, PricingError> {
        self.estimator.train(samples, config)
    }

    pub fn fine_tune(
        &mut self,
        samples: &[TrainingSample],
        config: &FineTuneConfig,
    ) -> Result<TrainingHistory, PricingError> {
        self.estimator.fine_tune(samples, config)
    }

    pub fn evaluate(&self, samples: &[TrainingSample]) -> Result<EvaluationMetrics, PricingError> {
        self.estimator.evaluate(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PriceFairness;
    use crate::domain::{Category, RegressorKind};
    use crate::estimator::FormulaEstimator;

    #[test]
    fn generates_requested_sample_count_in_range() {
        let mut analyzer = PriceAnalyzer::with_seed(FormulaEstimator::new(), 100);
        let samples = analyzer.generate_training_data(100);
        assert_eq!(samples.len(), 100);
        for s in &samples {
            assert!(s.price >= 1.0);
            let (lo, hi) = Category::from_label(&s.category).unwrap().area_range();
            assert!(s.area_sqm >= lo && s.area_sqm <= hi, "{} outside {lo}..{hi}", s.area_sqm);
        }
    }

    #[test]
    fn market_rates_are_ordered() {
        let mut analyzer = PriceAnalyzer::with_seed(FormulaEstimator::new(), 5);
        for _ in 0..50 {
            let info = analyzer.get_market_rates("Electrical", "Kandy");
            assert!(info.min_market_rate <= info.avg_market_rate);
            assert!(info.avg_market_rate <= info.max_market_rate);
        }
    }

    #[test]
    fn dispute_through_the_facade() {
        let mut analyzer = PriceAnalyzer::with_seed(FormulaEstimator::new(), 6);
        let fair = analyzer.estimate("Carpentry", "Galle", 30.0, 5.0, 6.0).unwrap();

        let same = analyzer
            .evaluate_dispute("Carpentry", "Galle", 30.0, 5.0, 6.0, fair, None)
            .unwrap();
        assert_eq!(same.price_fairness, PriceFairness::Fair);

        let high = analyzer
            .evaluate_dispute("Carpentry", "Galle", 30.0, 5.0, 6.0, fair * 1.2, None)
            .unwrap();
        assert_eq!(high.price_fairness, PriceFairness::AboveMarket);
        assert!((high.price_difference_percentage - 20.0).abs() < 1e-6);
    }

    #[test]
    fn stricter_thresholds_change_the_verdict() {
        let strict = DisputeThresholds {
            fair_band_pct: 1.0,
            ..DisputeThresholds::default()
        };
        let mut analyzer = PriceAnalyzer::with_seed(FormulaEstimator::new(), 7).with_thresholds(strict);
        let fair = analyzer.estimate("Roofing", "Matara", 80.0, 5.0, 5.0).unwrap();
        let r = analyzer
            .evaluate_dispute("Roofing", "Matara", 80.0, 5.0, 5.0, fair * 1.05, None)
            .unwrap();
        assert_eq!(r.price_fairness, PriceFairness::AboveMarket);
    }

    #[test]
    fn train_then_analyze() {
        let mut analyzer = PriceAnalyzer::with_seed(TrainedEstimator::new(), 8);
        let samples = analyzer.generate_training_data(600);
        let config = TrainingConfig {
            regressor: RegressorKind::Ridge,
            ..TrainingConfig::default()
        };
        analyzer.train(&samples, &config).unwrap();

        let price = analyzer.estimate("Plumbing", "Kandy", 40.0, 5.0, 5.0).unwrap();
        assert!(price >= 0.0);

        let report = analyzer.analyze_regional_pricing("Plumbing", 40.0, 5.0, 5.0).unwrap();
        assert_eq!(report.regional_prices.len(), analyzer.estimator().known_locations().len());
        assert!(report.regional_prices.windows(2).all(|w| w[0].price <= w[1].price));

        let metrics = analyzer.evaluate(&samples[..100]).unwrap();
        assert_eq!(metrics.n, 100);
    }
}
