//! Regression models behind the trained estimator.
//!
//! Both models consume scaled feature rows and predict a price in LKR. They are
//! dispatched through the `Regressor` enum so a saved model file records which
//! one it holds.

pub mod mlp;
pub mod ridge;

pub use mlp::Mlp;
pub use ridge::Ridge;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::domain::{EpochMetrics, RegressorKind};
use crate::error::PricingError;
use crate::features::FeatureRow;

/// Borrowed feature rows and their prices.
#[derive(Debug, Clone, Copy)]
pub struct TrainSet<'a> {
    pub x: &'a [FeatureRow],
    pub y: &'a [f64],
}

impl TrainSet<'_> {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochPlan {
    pub epochs: usize,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Regressor {
    Mlp(Mlp),
    Ridge(Ridge),
}

impl Regressor {
    /// Build and fit a fresh regressor of `config.regressor` kind.
    pub fn fit<R: Rng + ?Sized>(
        config: &TrainingConfig,
        train: TrainSet<'_>,
        validation: Option<TrainSet<'_>>,
        rng: &mut R,
    ) -> Result<(Self, Vec<EpochMetrics>), PricingError> {
        match config.regressor {
            RegressorKind::Mlp => {
                let mut mlp = Mlp::new(&config.hidden_layers, config.learning_rate, train.y, rng)?;
                let plan = EpochPlan {
                    epochs: config.epochs,
                    batch_size: config.batch_size,
                };
                let history = mlp.train_epochs(train, validation, plan, rng);
                Ok((Regressor::Mlp(mlp), history))
            }
            RegressorKind::Ridge => {
                let ridge = Ridge::fit(train, config.ridge_lambda)?;
                let metrics = ridge.metrics(train, validation);
                Ok((Regressor::Ridge(ridge), vec![metrics]))
            }
        }
    }

    /// Continue training on `train` without resetting weights.
    pub fn fine_tune<R: Rng + ?Sized>(
        &mut self,
        train: TrainSet<'_>,
        plan: EpochPlan,
        rng: &mut R,
    ) -> Result<Vec<EpochMetrics>, PricingError> {
        match self {
            Regressor::Mlp(mlp) => Ok(mlp.train_epochs(train, None, plan, rng)),
            Regressor::Ridge(ridge) => {
                ridge.fine_tune(train)?;
                Ok(vec![ridge.metrics(train, None)])
            }
        }
    }

    pub fn kind(&self) -> RegressorKind {
        match self {
            Regressor::Mlp(_) => RegressorKind::Mlp,
            Regressor::Ridge(_) => RegressorKind::Ridge,
        }
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        match self {
            Regressor::Mlp(mlp) => mlp.predict(row),
            Regressor::Ridge(ridge) => ridge.predict(row),
        }
    }

    /// Whether the stored parameters fit encoded feature rows and yield one price.
    pub fn is_consistent(&self) -> bool {
        match self {
            Regressor::Mlp(mlp) => mlp.is_consistent(),
            Regressor::Ridge(ridge) => ridge.coefficient_count() == ridge::BASIS_LEN,
        }
    }
}

/// Mean squared and mean absolute error between predictions and prices.
pub(crate) fn price_errors(predicted: &[f64], actual: &[f64]) -> (f64, f64) {
    let n = actual.len().max(1) as f64;
    let mut sq = 0.0;
    let mut abs = 0.0;
    for (p, y) in predicted.iter().zip(actual) {
        let r = p - y;
        sq += r * r;
        abs += r.abs();
    }
    (sq / n, abs / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn regressor_round_trips_through_json() {
        let x: Vec<FeatureRow> = (0..30)
            .map(|i| {
                let t = i as f64 / 10.0 - 1.5;
                [t, -t, t * t, 0.5 * t, 1.0]
            })
            .collect();
        let y: Vec<f64> = x.iter().map(|r| 2000.0 + 400.0 * r[0]).collect();
        let config = TrainingConfig {
            regressor: RegressorKind::Ridge,
            ..TrainingConfig::default()
        };

        let mut rng = StdRng::seed_from_u64(8);
        let (model, history) = Regressor::fit(&config, TrainSet { x: &x, y: &y }, None, &mut rng).unwrap();
        assert_eq!(history.len(), 1);

        let json = serde_json::to_string(&model).unwrap();
        assert!(json.contains("\"kind\":\"ridge\""));
        let back: Regressor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), RegressorKind::Ridge);
        assert!(back.is_consistent());
        assert_eq!(back.predict(&x[3]), model.predict(&x[3]));
    }

    #[test]
    fn mlp_history_has_one_entry_per_epoch() {
        let x: Vec<FeatureRow> = (0..40).map(|i| [i as f64 / 40.0, 0.0, 0.0, 0.0, 0.0]).collect();
        let y: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let config = TrainingConfig {
            epochs: 4,
            hidden_layers: vec![4],
            ..TrainingConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(8);
        let (model, history) = Regressor::fit(&config, TrainSet { x: &x, y: &y }, None, &mut rng).unwrap();
        assert_eq!(model.kind(), RegressorKind::Mlp);
        assert_eq!(history.iter().map(|e| e.epoch).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }
}
