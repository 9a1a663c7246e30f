//! Thread-safe handle over a `TrainedEstimator`.
//!
//! Estimates take the read lock and may run concurrently (the regional
//! fan-out does); `train` / `fine_tune` take the write lock.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::{FineTuneConfig, TrainingConfig};
use crate::domain::{EstimatorKind, PriceQuery, TrainingHistory, TrainingSample};
use crate::error::PricingError;
use crate::estimator::{FairPriceEstimator, TrainedEstimator};

#[derive(Debug, Clone, Default)]
pub struct SharedEstimator {
    inner: Arc<RwLock<TrainedEstimator>>,
}

impl SharedEstimator {
    pub fn new(estimator: TrainedEstimator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(estimator)),
        }
    }

    pub fn train(&self, samples: &[TrainingSample], config: &TrainingConfig) -> Result<TrainingHistory, PricingError> {
        self.write()?.train(samples, config)
    }

    pub fn fine_tune(
        &self,
        samples: &[TrainingSample],
        config: &FineTuneConfig,
    ) -> Result<TrainingHistory, PricingError> {
        self.write()?.fine_tune(samples, config)
    }

    /// Clone of the current estimator state.
    pub fn snapshot(&self) -> Result<TrainedEstimator, PricingError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TrainedEstimator>, PricingError> {
        self.inner.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TrainedEstimator>, PricingError> {
        self.inner.write().map_err(poisoned)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> PricingError {
    PricingError::invalid_state("estimator lock poisoned by a panicked writer")
}

impl FairPriceEstimator for SharedEstimator {
    fn kind(&self) -> EstimatorKind {
        self.read().map(|e| e.kind()).unwrap_or(EstimatorKind::Untrained)
    }

    fn estimate(&self, query: &PriceQuery) -> Result<f64, PricingError> {
        self.read()?.estimate(query)
    }

    /// Empty when the lock is poisoned.
    fn known_categories(&self) -> Vec<String> {
        self.read().map(|e| e.known_categories()).unwrap_or_default()
    }

    fn known_locations(&self) -> Vec<String> {
        self.read().map(|e| e.known_locations()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_training_data;
    use crate::domain::RegressorKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn concurrent_estimates_after_training() {
        let shared = SharedEstimator::default();
        let mut rng = StdRng::seed_from_u64(21);
        let data = generate_training_data(300, &mut rng);
        let config = TrainingConfig {
            regressor: RegressorKind::Ridge,
            ..TrainingConfig::default()
        };
        shared.train(&data, &config).unwrap();
        assert_eq!(shared.kind(), EstimatorKind::Trained(RegressorKind::Ridge));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let est = shared.clone();
                std::thread::spawn(move || {
                    let q = PriceQuery::new("Plumbing", "Jaffna", 10.0 + i as f64, 5.0, 5.0);
                    est.estimate(&q).unwrap()
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap() >= 0.0);
        }
    }

    #[test]
    fn poisoned_lock_is_invalid_state() {
        let shared = SharedEstimator::default();
        let writer = shared.clone();
        let _ = std::thread::spawn(move || {
            let _guard = writer.inner.write().unwrap();
            panic!("writer died");
        })
        .join();

        let err = shared.estimate(&PriceQuery::new("Masonry", "Colombo", 1.0, 1.0, 1.0)).unwrap_err();
        assert!(matches!(err, PricingError::InvalidState(_)));
        assert!(shared.known_locations().is_empty());
    }
}
