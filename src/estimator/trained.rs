//! Model-backed estimator: feature mapping + scaler + regressor.

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::config::{FineTuneConfig, TrainingConfig};
use crate::domain::{EstimatorKind, EvaluationMetrics, PriceQuery, RegressorKind, TrainingHistory, TrainingSample};
use crate::error::PricingError;
use crate::estimator::FairPriceEstimator;
use crate::features::{FeatureMapping, FeatureRow, FeatureScaler};
use crate::io::{load_model, save_model};
use crate::math::regression_metrics;
use crate::models::{EpochPlan, Regressor, TrainSet};

#[derive(Debug, Clone)]
struct Fitted {
    scaler: FeatureScaler,
    regressor: Regressor,
}

/// Estimator that learns prices from labelled samples.
///
/// Starts empty: `estimate`, `fine_tune`, `evaluate` and `save` fail with
/// `InvalidState` until `train` or `load` succeeds.
#[derive(Debug, Clone, Default)]
pub struct TrainedEstimator {
    mapping: FeatureMapping,
    fitted: Option<Fitted>,
}

impl TrainedEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn mapping(&self) -> &FeatureMapping {
        &self.mapping
    }

    pub fn scaler(&self) -> Option<&FeatureScaler> {
        self.fitted.as_ref().map(|f| &f.scaler)
    }

    pub fn regressor_kind(&self) -> Option<RegressorKind> {
        self.fitted.as_ref().map(|f| f.regressor.kind())
    }

    /// Fit from scratch: extend mappings, refit the scaler, refit the regressor.
    ///
    /// The last `validation_split` fraction of `samples` is held out for the
    /// validation columns of the history; the scaler sees every row.
    pub fn train(&mut self, samples: &[TrainingSample], config: &TrainingConfig) -> Result<TrainingHistory, PricingError> {
        validate_samples(samples)?;
        validate_plan(config.epochs, config.batch_size)?;
        if !(0.0..1.0).contains(&config.validation_split) {
            return Err(PricingError::invalid_input(format!(
                "validation_split must be in [0, 1), got {}",
                config.validation_split
            )));
        }

        let n = samples.len();
        let n_val = (n as f64 * config.validation_split).floor() as usize;
        let n_train = n - n_val;
        if n_train == 0 {
            return Err(PricingError::invalid_input("validation split leaves no training rows"));
        }

        // Mappings are only touched once the inputs are known to be usable.
        let added = self.mapping.extend(samples);
        let rows = self.encode_all(samples)?;
        let prices: Vec<f64> = samples.iter().map(|s| s.price).collect();

        let scaler = FeatureScaler::fit(&rows)?;
        let scaled = scaler.transform_all(&rows);
        let (train_x, val_x) = scaled.split_at(n_train);
        let (train_y, val_y) = prices.split_at(n_train);
        let validation = (!val_x.is_empty()).then_some(TrainSet { x: val_x, y: val_y });

        let mut rng = StdRng::seed_from_u64(config.seed);
        let (regressor, epochs) = Regressor::fit(config, TrainSet { x: train_x, y: train_y }, validation, &mut rng)?;

        let history = TrainingHistory {
            regressor: regressor.kind(),
            train_samples: n_train,
            validation_samples: n_val,
            epochs,
        };
        if let Some(last) = history.final_epoch() {
            info!(
                regressor = regressor.kind().display_name(),
                train = n_train,
                validation = n_val,
                new_labels = added,
                loss = last.loss,
                mae = last.mae,
                val_mae = ?last.val_mae,
                "training complete"
            );
        }

        self.fitted = Some(Fitted { scaler, regressor });
        Ok(history)
    }

    /// Continue training on new samples. The scaler is kept as fitted.
    pub fn fine_tune(
        &mut self,
        samples: &[TrainingSample],
        config: &FineTuneConfig,
    ) -> Result<TrainingHistory, PricingError> {
        let Some(fitted) = self.fitted.as_mut() else {
            return Err(PricingError::invalid_state("no trained model to fine-tune; train or load one first"));
        };
        validate_samples(samples)?;
        validate_plan(config.epochs, config.batch_size)?;

        let added = self.mapping.extend(samples);
        if added > 0 {
            warn!(new_labels = added, "fine-tune data introduces labels the scaler was not fitted on");
        }
        let rows = samples
            .iter()
            .map(|s| self.mapping.encode(&s.query()))
            .collect::<Result<Vec<_>, _>>()?;
        let prices: Vec<f64> = samples.iter().map(|s| s.price).collect();

        let scaled = fitted.scaler.transform_all(&rows);
        let plan = EpochPlan {
            epochs: config.epochs,
            batch_size: config.batch_size,
        };
        let mut rng = StdRng::seed_from_u64(config.seed);
        let epochs = fitted
            .regressor
            .fine_tune(TrainSet { x: &scaled, y: &prices }, plan, &mut rng)?;

        let history = TrainingHistory {
            regressor: fitted.regressor.kind(),
            train_samples: samples.len(),
            validation_samples: 0,
            epochs,
        };
        if let Some(last) = history.final_epoch() {
            info!(rows = samples.len(), loss = last.loss, mae = last.mae, "fine-tune complete");
        }
        Ok(history)
    }

    /// Prediction quality over labelled samples.
    pub fn evaluate(&self, samples: &[TrainingSample]) -> Result<EvaluationMetrics, PricingError> {
        if samples.is_empty() {
            return Err(PricingError::invalid_input("no samples to evaluate"));
        }
        let predicted = samples
            .iter()
            .map(|s| self.estimate(&s.query()))
            .collect::<Result<Vec<_>, _>>()?;
        let actual: Vec<f64> = samples.iter().map(|s| s.price).collect();
        regression_metrics(&actual, &predicted).ok_or_else(|| PricingError::invalid_input("no samples to evaluate"))
    }

    /// Persist mappings, scaler and regressor under `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), PricingError> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| PricingError::invalid_state("nothing to save; the estimator is untrained"))?;
        save_model(dir, &self.mapping, &fitted.scaler, &fitted.regressor)
    }

    pub fn load(dir: &Path) -> Result<Self, PricingError> {
        let (mapping, scaler, regressor) = load_model(dir)?;
        Ok(Self {
            mapping,
            fitted: Some(Fitted { scaler, regressor }),
        })
    }

    fn encode_all(&self, samples: &[TrainingSample]) -> Result<Vec<FeatureRow>, PricingError> {
        samples.iter().map(|s| self.mapping.encode(&s.query())).collect()
    }
}

impl FairPriceEstimator for TrainedEstimator {
    fn kind(&self) -> EstimatorKind {
        match &self.fitted {
            Some(f) => EstimatorKind::Trained(f.regressor.kind()),
            None => EstimatorKind::Untrained,
        }
    }

    fn estimate(&self, query: &PriceQuery) -> Result<f64, PricingError> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| PricingError::invalid_state("no trained model; train or load one first"))?;
        let row = fitted.scaler.transform(&self.mapping.encode(query)?);
        // `max` also maps a NaN prediction to zero.
        Ok(fitted.regressor.predict(&row).max(0.0))
    }

    fn known_categories(&self) -> Vec<String> {
        self.mapping.category.labels().to_vec()
    }

    fn known_locations(&self) -> Vec<String> {
        self.mapping.location.labels().to_vec()
    }
}

fn validate_samples(samples: &[TrainingSample]) -> Result<(), PricingError> {
    if samples.is_empty() {
        return Err(PricingError::invalid_input("no training samples"));
    }
    for (i, s) in samples.iter().enumerate() {
        let numbers = [s.area_sqm, s.complexity_score, s.material_quality_score, s.price];
        if numbers.iter().any(|v| !v.is_finite()) {
            return Err(PricingError::invalid_input(format!("sample {i} has a non-finite value")));
        }
    }
    Ok(())
}

fn validate_plan(epochs: usize, batch_size: usize) -> Result<(), PricingError> {
    if epochs == 0 {
        return Err(PricingError::invalid_input("epochs must be at least 1"));
    }
    if batch_size == 0 {
        return Err(PricingError::invalid_input("batch_size must be at least 1"));
    }
    Ok(())
}
