//! Ridge regression over a quadratic expansion of the scaled features.
//!
//! The basis is `[1, x₀‥x₄, xᵢ·xⱼ (i ≤ j)]` (21 columns) and the target is
//! `ln(price)`, so location and trade effects act multiplicatively the way the
//! pricing model assumes. Fitting is a single closed-form solve; fine-tuning
//! re-solves on the new rows while shrinking toward the previous coefficients.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::EpochMetrics;
use crate::error::PricingError;
use crate::features::{FEATURE_DIM, FeatureRow};
use crate::math::solve_ridge;
use crate::models::{TrainSet, price_errors};

/// Number of basis columns for `FEATURE_DIM` inputs.
pub const BASIS_LEN: usize = 1 + FEATURE_DIM + FEATURE_DIM * (FEATURE_DIM + 1) / 2;

/// Per-row weight of the pull toward the previous coefficients when fine-tuning.
const FINE_TUNE_ANCHOR: f64 = 0.5;

/// Largest log-price we exponentiate.
const MAX_LOG_PRICE: f64 = 700.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ridge {
    coefficients: Vec<f64>,
    lambda: f64,
}

impl Ridge {
    pub fn fit(train: TrainSet<'_>, lambda: f64) -> Result<Self, PricingError> {
        if !(lambda.is_finite() && lambda >= 0.0) {
            return Err(PricingError::invalid_input(format!("ridge lambda must be >= 0, got {lambda}")));
        }
        let (x, y) = design(train);
        let beta = solve_ridge(&x, &y, lambda, None)
            .ok_or_else(|| PricingError::invalid_input("training rows are too degenerate to fit"))?;

        Ok(Self {
            coefficients: beta.iter().copied().collect(),
            lambda,
        })
    }

    pub fn fine_tune(&mut self, train: TrainSet<'_>) -> Result<(), PricingError> {
        let (x, y) = design(train);
        let prior = DVector::from_column_slice(&self.coefficients);
        let strength = self.lambda.max(FINE_TUNE_ANCHOR * train.len() as f64);
        let beta = solve_ridge(&x, &y, strength, Some(&prior))
            .ok_or_else(|| PricingError::invalid_input("fine-tune rows are too degenerate to fit"))?;
        debug!(rows = train.len(), strength, "ridge fine-tune solved");
        self.coefficients = beta.iter().copied().collect();
        Ok(())
    }

    pub fn coefficient_count(&self) -> usize {
        self.coefficients.len()
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let log_price: f64 = basis(row)
            .iter()
            .zip(&self.coefficients)
            .map(|(b, c)| b * c)
            .sum();
        log_price.min(MAX_LOG_PRICE).exp()
    }

    /// Training (and optional validation) errors for the current coefficients.
    pub fn metrics(&self, train: TrainSet<'_>, validation: Option<TrainSet<'_>>) -> EpochMetrics {
        let preds: Vec<f64> = train.x.iter().map(|r| self.predict(r)).collect();
        let (loss, mae) = price_errors(&preds, train.y);
        let (val_loss, val_mae) = match validation {
            Some(val) if !val.is_empty() => {
                let preds: Vec<f64> = val.x.iter().map(|r| self.predict(r)).collect();
                let (mse, mae) = price_errors(&preds, val.y);
                (Some(mse), Some(mae))
            }
            _ => (None, None),
        };
        EpochMetrics {
            epoch: 1,
            loss,
            mae,
            val_loss,
            val_mae,
        }
    }
}

fn basis(row: &FeatureRow) -> [f64; BASIS_LEN] {
    let mut out = [0.0; BASIS_LEN];
    out[0] = 1.0;
    out[1..=FEATURE_DIM].copy_from_slice(row);
    let mut k = 1 + FEATURE_DIM;
    for i in 0..FEATURE_DIM {
        for j in i..FEATURE_DIM {
            out[k] = row[i] * row[j];
            k += 1;
        }
    }
    out
}

fn design(train: TrainSet<'_>) -> (DMatrix<f64>, DVector<f64>) {
    let n = train.len();
    let mut x = DMatrix::<f64>::zeros(n, BASIS_LEN);
    for (i, row) in train.x.iter().enumerate() {
        for (j, v) in basis(row).into_iter().enumerate() {
            x[(i, j)] = v;
        }
    }
    let y = DVector::from_iterator(n, train.y.iter().map(|p| p.max(1.0).ln()));
    (x, y)
}
