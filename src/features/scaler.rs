//! Per-dimension standardisation.
//!
//! Fitted once over the training rows, then applied unchanged to every
//! inference row. Fine-tuning reuses the existing parameters.

use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::features::{FEATURE_DIM, FeatureRow};

/// Zero-mean / unit-variance scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: FeatureRow,
    /// Population standard deviation; a constant column stores 1.0.
    pub scale: FeatureRow,
}

impl FeatureScaler {
    pub fn fit(rows: &[FeatureRow]) -> Result<Self, PricingError> {
        if rows.is_empty() {
            return Err(PricingError::invalid_input("cannot fit scaler on zero rows"));
        }
        let n = rows.len() as f64;

        let mut mean = [0.0; FEATURE_DIM];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut scale = [0.0; FEATURE_DIM];
        for row in rows {
            for j in 0..FEATURE_DIM {
                let d = row[j] - mean[j];
                scale[j] += d * d;
            }
        }
        for s in &mut scale {
            *s = (*s / n).sqrt();
            if !(s.is_finite() && *s > 0.0) {
                *s = 1.0;
            }
        }

        if mean.iter().any(|m| !m.is_finite()) {
            return Err(PricingError::invalid_input("feature rows contain non-finite values"));
        }

        Ok(Self { mean, scale })
    }

    pub fn transform(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = [0.0; FEATURE_DIM];
        for j in 0..FEATURE_DIM {
            out[j] = (row[j] - self.mean[j]) / self.scale[j];
        }
        out
    }

    pub fn transform_all(&self, rows: &[FeatureRow]) -> Vec<FeatureRow> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitted_rows_have_zero_mean_unit_variance() {
        let rows = [
            [0.0, 1.0, 10.0, 2.0, 3.0],
            [1.0, 1.0, 20.0, 4.0, 5.0],
            [2.0, 1.0, 30.0, 6.0, 7.0],
        ];
        let scaler = FeatureScaler::fit(&rows).unwrap();
        let scaled = scaler.transform_all(&rows);

        for j in [0, 2, 3, 4] {
            let m: f64 = scaled.iter().map(|r| r[j]).sum::<f64>() / 3.0;
            let v: f64 = scaled.iter().map(|r| r[j] * r[j]).sum::<f64>() / 3.0;
            assert!(m.abs() < 1e-12);
            assert!((v - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_column_is_centred_not_divided_by_zero() {
        let rows = [[3.0, 1.0, 10.0, 2.0, 3.0], [3.0, 2.0, 20.0, 4.0, 5.0]];
        let scaler = FeatureScaler::fit(&rows).unwrap();
        assert_eq!(scaler.scale[0], 1.0);
        assert_eq!(scaler.transform(&rows[0])[0], 0.0);
    }

    #[test]
    fn empty_fit_is_rejected() {
        assert!(matches!(FeatureScaler::fit(&[]), Err(PricingError::InvalidInput(_))));
    }
}
