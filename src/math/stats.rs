//! Summary statistics over price lists.
//!
//! Everything returns `None` on empty input instead of NaN so callers have to
//! decide what an empty fan-out means.

use crate::domain::EvaluationMetrics;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median (average of the two middle values for even lengths).
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Population standard deviation (divides by `n`).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    Some((lo, hi))
}

/// Regression quality of `predicted` against `actual`.
pub fn regression_metrics(actual: &[f64], predicted: &[f64]) -> Option<EvaluationMetrics> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let n = actual.len();
    let y_mean = mean(actual)?;

    let mut sse = 0.0;
    let mut sae = 0.0;
    let mut ss_total = 0.0;
    let mut ape = 0.0;
    let mut ape_n = 0usize;
    for (&y, &p) in actual.iter().zip(predicted) {
        let r = y - p;
        sse += r * r;
        sae += r.abs();
        ss_total += (y - y_mean) * (y - y_mean);
        if y != 0.0 {
            ape += (r / y).abs();
            ape_n += 1;
        }
    }

    let mape = if ape_n > 0 { ape / ape_n as f64 * 100.0 } else { 0.0 };
    let r_squared = if ss_total > 0.0 { 1.0 - sse / ss_total } else { 0.0 };

    Some(EvaluationMetrics {
        n,
        mean_squared_error: sse / n as f64,
        mean_absolute_error: sae / n as f64,
        mean_absolute_percentage_error: mape,
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_statistics() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(mean(&v), Some(2.5));
        assert_eq!(median(&v), Some(2.5));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(min_max(&v), Some((1.0, 4.0)));
        let sd = std_dev(&v).unwrap();
        assert!((sd - 1.25_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(mean(&[]).is_none());
        assert!(median(&[]).is_none());
        assert!(std_dev(&[]).is_none());
        assert!(min_max(&[]).is_none());
        assert!(regression_metrics(&[], &[]).is_none());
    }

    #[test]
    fn perfect_predictions_have_unit_r_squared() {
        let y = [100.0, 200.0, 300.0];
        let m = regression_metrics(&y, &y).unwrap();
        assert_eq!(m.mean_squared_error, 0.0);
        assert_eq!(m.mean_absolute_percentage_error, 0.0);
        assert!((m.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mape_skips_zero_targets() {
        let m = regression_metrics(&[0.0, 100.0], &[10.0, 110.0]).unwrap();
        assert!((m.mean_absolute_percentage_error - 10.0).abs() < 1e-9);
        assert!((m.mean_absolute_error - 10.0).abs() < 1e-9);
    }
}
