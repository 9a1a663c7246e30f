//! Dense ReLU network trained with Adam on a standardised target.
//!
//! Layout: `FEATURE_DIM → hidden[0] → … → hidden[k] → 1`, ReLU between hidden
//! layers, linear output. Batches are column-major (`features × batch`).
//!
//! The target is standardised with the training mean/std fixed at build time;
//! fine-tuning keeps those so earlier weights stay meaningful. Adam moments are
//! persisted with the weights so a reloaded model resumes where it stopped.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::EpochMetrics;
use crate::error::PricingError;
use crate::features::{FEATURE_DIM, FeatureRow};
use crate::models::{EpochPlan, TrainSet, price_errors};

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const ADAM_EPS: f64 = 1e-7;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DenseLayer {
    /// `out × in`.
    weights: DMatrix<f64>,
    bias: DVector<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AdamMoments {
    m_w: DMatrix<f64>,
    v_w: DMatrix<f64>,
    m_b: DVector<f64>,
    v_b: DVector<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mlp {
    layers: Vec<DenseLayer>,
    moments: Vec<AdamMoments>,
    step: u64,
    learning_rate: f64,
    target_mean: f64,
    target_scale: f64,
}

struct Forward {
    /// Layer inputs; `activations[0]` is the batch itself, the last is the output.
    activations: Vec<DMatrix<f64>>,
    /// Pre-activation values per layer.
    pre: Vec<DMatrix<f64>>,
}

impl Mlp {
    /// Build a freshly initialised network (He-normal hidden layers).
    pub fn new<R: Rng + ?Sized>(
        hidden: &[usize],
        learning_rate: f64,
        target: &[f64],
        rng: &mut R,
    ) -> Result<Self, PricingError> {
        if hidden.iter().any(|&w| w == 0) {
            return Err(PricingError::invalid_input("hidden layer widths must be > 0"));
        }
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(PricingError::invalid_input(format!(
                "learning rate must be finite and > 0, got {learning_rate}"
            )));
        }
        let target_mean = crate::math::mean(target)
            .ok_or_else(|| PricingError::invalid_input("cannot build a network without targets"))?;
        let target_scale = crate::math::std_dev(target)
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(1.0);

        let mut widths = Vec::with_capacity(hidden.len() + 2);
        widths.push(FEATURE_DIM);
        widths.extend_from_slice(hidden);
        widths.push(1);

        let mut layers = Vec::with_capacity(widths.len() - 1);
        let mut moments = Vec::with_capacity(widths.len() - 1);
        for (i, pair) in widths.windows(2).enumerate() {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let is_output = i + 2 == widths.len();
            let gain = if is_output { 1.0 } else { 2.0 };
            let normal = Normal::new(0.0, (gain / fan_in as f64).sqrt())
                .map_err(|e| PricingError::invalid_input(format!("weight init distribution: {e}")))?;

            layers.push(DenseLayer {
                weights: DMatrix::from_fn(fan_out, fan_in, |_, _| normal.sample(rng)),
                bias: DVector::zeros(fan_out),
            });
            moments.push(AdamMoments {
                m_w: DMatrix::zeros(fan_out, fan_in),
                v_w: DMatrix::zeros(fan_out, fan_in),
                m_b: DVector::zeros(fan_out),
                v_b: DVector::zeros(fan_out),
            });
        }

        Ok(Self {
            layers,
            moments,
            step: 0,
            learning_rate,
            target_mean,
            target_scale,
        })
    }

    /// Whether the stored layers chain `FEATURE_DIM → … → 1` with matching
    /// biases and Adam moments.
    pub fn is_consistent(&self) -> bool {
        if self.layers.is_empty() || self.layers.len() != self.moments.len() {
            return false;
        }
        if !(self.target_mean.is_finite() && self.target_scale.is_finite() && self.target_scale > 0.0) {
            return false;
        }

        let mut width = FEATURE_DIM;
        for (layer, moments) in self.layers.iter().zip(&self.moments) {
            let shape = layer.weights.shape();
            if shape.1 != width || layer.bias.len() != shape.0 {
                return false;
            }
            if moments.m_w.shape() != shape || moments.v_w.shape() != shape {
                return false;
            }
            if moments.m_b.len() != shape.0 || moments.v_b.len() != shape.0 {
                return false;
            }
            width = shape.0;
        }
        width == 1
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let x = DMatrix::from_column_slice(FEATURE_DIM, 1, row);
        let fwd = self.forward(x);
        self.unstandardise(output_at(&fwd, 0))
    }

    /// Run `plan.epochs` passes of shuffled mini-batch Adam over `train`.
    pub fn train_epochs<R: Rng + ?Sized>(
        &mut self,
        train: TrainSet<'_>,
        validation: Option<TrainSet<'_>>,
        plan: EpochPlan,
        rng: &mut R,
    ) -> Vec<EpochMetrics> {
        let n = train.len();
        let batch_size = plan.batch_size.max(1);
        let mut order: Vec<usize> = (0..n).collect();
        let mut history = Vec::with_capacity(plan.epochs);

        for epoch in 1..=plan.epochs {
            order.shuffle(rng);

            let mut sq_sum = 0.0;
            let mut abs_sum = 0.0;
            for chunk in order.chunks(batch_size) {
                let (sq, abs) = self.train_batch(train, chunk);
                sq_sum += sq;
                abs_sum += abs;
            }

            let scale = self.target_scale;
            let loss = sq_sum / n as f64 * scale * scale;
            let mae = abs_sum / n as f64 * scale;
            let (val_loss, val_mae) = match validation {
                Some(val) if !val.is_empty() => {
                    let preds: Vec<f64> = val.x.iter().map(|row| self.predict(row)).collect();
                    let (mse, mae) = price_errors(&preds, val.y);
                    (Some(mse), Some(mae))
                }
                _ => (None, None),
            };

            debug!(epoch, loss, mae, ?val_loss, "mlp epoch");
            history.push(EpochMetrics {
                epoch,
                loss,
                mae,
                val_loss,
                val_mae,
            });
        }

        history
    }

    /// One Adam step on the rows in `batch`.
    ///
    /// Returns the batch's summed squared and absolute errors in standardised units,
    /// measured before the update.
    fn train_batch(&mut self, train: TrainSet<'_>, batch: &[usize]) -> (f64, f64) {
        let b = batch.len();
        let x = DMatrix::from_fn(FEATURE_DIM, b, |r, c| train.x[batch[c]][r]);
        let y: Vec<f64> = batch.iter().map(|&i| self.standardise(train.y[i])).collect();

        let fwd = self.forward(x);

        let mut sq = 0.0;
        let mut abs = 0.0;
        let mut delta = DMatrix::<f64>::zeros(1, b);
        for c in 0..b {
            let r = output_at(&fwd, c) - y[c];
            sq += r * r;
            abs += r.abs();
            // d(MSE)/d(out)
            delta[(0, c)] = 2.0 * r / b as f64;
        }

        self.step += 1;
        let step = self.step;
        let lr = self.learning_rate;

        for l in (0..self.layers.len()).rev() {
            let grad_w = &delta * fwd.activations[l].transpose();
            let grad_b = delta.column_sum();

            let next_delta = if l > 0 {
                let mut d = self.layers[l].weights.transpose() * &delta;
                let mask = fwd.pre[l - 1].map(|v| if v > 0.0 { 1.0 } else { 0.0 });
                d.component_mul_assign(&mask);
                Some(d)
            } else {
                None
            };

            let layer = &mut self.layers[l];
            let moments = &mut self.moments[l];
            adam_update(
                layer.weights.as_mut_slice(),
                grad_w.as_slice(),
                moments.m_w.as_mut_slice(),
                moments.v_w.as_mut_slice(),
                lr,
                step,
            );
            adam_update(
                layer.bias.as_mut_slice(),
                grad_b.as_slice(),
                moments.m_b.as_mut_slice(),
                moments.v_b.as_mut_slice(),
                lr,
                step,
            );

            if let Some(d) = next_delta {
                delta = d;
            }
        }

        (sq, abs)
    }

    fn forward(&self, x: DMatrix<f64>) -> Forward {
        let depth = self.layers.len();
        let mut activations = Vec::with_capacity(depth + 1);
        let mut pre = Vec::with_capacity(depth);
        activations.push(x);

        for (i, layer) in self.layers.iter().enumerate() {
            let mut z = &layer.weights * &activations[i];
            for c in 0..z.ncols() {
                for r in 0..z.nrows() {
                    z[(r, c)] += layer.bias[r];
                }
            }
            let a = if i + 1 < depth { z.map(|v| v.max(0.0)) } else { z.clone() };
            pre.push(z);
            activations.push(a);
        }

        Forward { activations, pre }
    }

    fn standardise(&self, price: f64) -> f64 {
        (price - self.target_mean) / self.target_scale
    }

    fn unstandardise(&self, value: f64) -> f64 {
        value * self.target_scale + self.target_mean
    }
}

fn output_at(fwd: &Forward, col: usize) -> f64 {
    fwd.activations.last().map_or(0.0, |out| out[(0, col)])
}

fn adam_update(params: &mut [f64], grads: &[f64], m: &mut [f64], v: &mut [f64], lr: f64, step: u64) {
    let t = step.min(i32::MAX as u64) as i32;
    let bias1 = 1.0 - BETA1.powi(t);
    let bias2 = 1.0 - BETA2.powi(t);
    for i in 0..params.len() {
        let g = grads[i];
        m[i] = BETA1 * m[i] + (1.0 - BETA1) * g;
        v[i] = BETA2 * v[i] + (1.0 - BETA2) * g * g;
        let m_hat = m[i] / bias1;
        let v_hat = v[i] / bias2;
        params[i] -= lr * m_hat / (v_hat.sqrt() + ADAM_EPS);
    }
}
