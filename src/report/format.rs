//! Plain-text terminal reports.
//!
//! All formatting lives here so the estimation and analysis code stays free of
//! presentation concerns. `--json` output bypasses this module entirely.

use crate::analysis::{BenchmarkReport, DisputeResult, RegionalReport};
use crate::domain::{CURRENCY, EstimatorKind, EvaluationMetrics, PriceQuery, TrainingHistory};
use crate::market::MarketRateInfo;

pub fn format_estimate(query: &PriceQuery, price: f64, kind: EstimatorKind) -> String {
    let mut out = String::new();
    out.push_str("=== Fair price estimate ===\n");
    out.push_str(&format_job(query));
    out.push_str(&format!("Estimator: {kind}\n"));
    out.push_str(&format!("Fair price: {}\n", money(price)));
    out
}

pub fn format_market_rates(info: &MarketRateInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Market rates: {} in {} ===\n", info.category, info.location));
    out.push_str(&format!(
        "Base rate: {} | location factor: {:.2} | material share: {:.0}%\n",
        money(info.base_rate),
        info.location_factor,
        info.material_cost_percentage
    ));
    out.push_str(&format!("Adjusted rate: {} {}\n", money(info.adjusted_rate), info.unit));
    out.push_str(&format!(
        "Market: min={:.2} avg={:.2} max={:.2} {}\n",
        info.min_market_rate, info.avg_market_rate, info.max_market_rate, info.currency
    ));
    out.push_str(&format!(
        "Sample size: {} | material trend: {:?} | updated: {}\n",
        info.sample_size, info.material_cost_trend, info.last_updated
    ));
    out
}

pub fn format_regional_report(report: &RegionalReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Regional pricing: {} ===\n", report.category));
    out.push_str(&format!(
        "Job: area={:.1} m² | complexity={:.1} | material={:.1}\n",
        report.area_sqm, report.complexity_score, report.material_quality_score
    ));
    out.push_str(&format!(
        "Mean={:.2} Median={:.2} Std={:.2} Range={:.2} Ratio={} {}\n",
        report.avg_price,
        report.median_price,
        report.standard_deviation,
        report.price_range,
        report
            .price_ratio
            .map(|r| format!("{r:.3}"))
            .unwrap_or_else(|| "undefined".to_string()),
        report.currency
    ));
    out.push_str(&format!(
        "Cheapest: {} ({}) | Most expensive: {} ({})\n",
        report.cheapest_location,
        report.cheapest_province,
        report.most_expensive_location,
        report.most_expensive_province
    ));

    out.push_str("\nBy location:\n");
    out.push_str(&format!("{:<20} {:<16} {:>14}\n", "location", "province", "price"));
    out.push_str(&format!("{:-<20} {:-<16} {:-<14}\n", "", "", ""));
    for p in &report.regional_prices {
        out.push_str(&format!(
            "{:<20} {:<16} {:>14.2}\n",
            truncate(&p.location, 20),
            p.province.display_name(),
            p.price
        ));
    }

    out.push_str("\nBy province:\n");
    out.push_str(&format!("{:<16} {:>9} {:>14}\n", "province", "locations", "avg price"));
    out.push_str(&format!("{:-<16} {:-<9} {:-<14}\n", "", "", ""));
    for p in &report.provincial_averages {
        out.push_str(&format!(
            "{:<16} {:>9} {:>14.2}\n",
            p.province.display_name(),
            p.locations,
            p.avg_price
        ));
    }
    out
}

pub fn format_dispute(result: &DisputeResult) -> String {
    let mut out = String::new();
    out.push_str("=== Dispute evaluation ===\n");
    out.push_str(&format!(
        "Job: {} in {} | area={:.1} m² | complexity={:.1} | material={:.1}\n",
        result.category, result.location, result.area_sqm, result.complexity_score, result.material_quality_score
    ));
    out.push_str(&format!("Fair price: {}\n", money(result.predicted_fair_price)));
    out.push_str(&format!(
        "Area-adjusted fair price: {} (x{:.2})\n",
        money(result.area_adjusted_fair_price),
        result.area_adjustment
    ));
    out.push_str(&format!(
        "Contractor price: {} ({}, {})\n",
        money(result.contractor_price),
        signed_pct(result.price_difference_percentage),
        result.price_fairness.label()
    ));
    if let (Some(expectation), Some(assessment)) = (result.client_expectation, result.client_expectation_assessment) {
        out.push_str(&format!(
            "Client expectation: {} ({}, {})\n",
            money(expectation),
            signed_pct(result.client_difference_percentage.unwrap_or(0.0)),
            assessment.label()
        ));
    }
    out.push_str(&format!(
        "Market: min={:.2} avg={:.2} max={:.2} {}\n",
        result.market_rate_min, result.market_rate_avg, result.market_rate_max, result.currency
    ));
    out.push_str(&format!("\nRecommendation: {}\n", result.recommendation));
    out.push_str(&format!("Resolution: {}\n", result.resolution));
    out
}

pub fn format_benchmark(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Benchmark ({CURRENCY}): area={:.1} m² | complexity={:.1} | material={:.1} ===\n",
        report.job.area_sqm, report.job.complexity_score, report.job.material_quality_score
    ));

    let mut header = format!("{:<20}", "category");
    for location in &report.locations {
        header.push_str(&format!(" {:>12}", truncate(location, 12)));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    for (category, row) in report.categories.iter().zip(&report.prices) {
        let mut line = format!("{:<20}", truncate(category, 20));
        for price in row {
            line.push_str(&format!(" {price:>12.2}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

pub fn format_training_history(history: &TrainingHistory) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Training ({}) === train={} validation={}\n",
        history.regressor.display_name(),
        history.train_samples,
        history.validation_samples
    ));
    out.push_str(&format!(
        "{:>6} {:>16} {:>12} {:>16} {:>12}\n",
        "epoch", "loss", "mae", "val_loss", "val_mae"
    ));
    for e in &history.epochs {
        out.push_str(
            format!(
                "{:>6} {:>16.2} {:>12.2} {:>16} {:>12}\n",
                e.epoch,
                e.loss,
                e.mae,
                opt(e.val_loss),
                opt(e.val_mae)
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub fn format_evaluation(metrics: &EvaluationMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Evaluation (n={}) ===\n", metrics.n));
    out.push_str(&format!("MSE : {:.2}\n", metrics.mean_squared_error));
    out.push_str(&format!("MAE : {:.2} {CURRENCY}\n", metrics.mean_absolute_error));
    out.push_str(&format!("MAPE: {:.2}%\n", metrics.mean_absolute_percentage_error));
    out.push_str(&format!("R²  : {:.4}\n", metrics.r_squared));
    out
}

fn format_job(query: &PriceQuery) -> String {
    format!(
        "Job: {} in {} | area={:.1} m² | complexity={:.1} | material={:.1}\n",
        query.category, query.location, query.area_sqm, query.complexity_score, query.material_quality_score
    )
}

fn money(v: f64) -> String {
    format!("{v:.2} {CURRENCY}")
}

fn signed_pct(v: f64) -> String {
    if v.is_finite() {
        format!("{v:+.1}%")
    } else if v > 0.0 {
        "+inf%".to_string()
    } else {
        "-inf%".to_string()
    }
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{BenchmarkJob, benchmark_report};
    use crate::domain::{EpochMetrics, RegressorKind};
    use crate::estimator::FormulaEstimator;

    #[test]
    fn estimate_report_shows_two_decimals() {
        let q = PriceQuery::new("Masonry", "Colombo", 50.0, 5.0, 5.0);
        let text = format_estimate(&q, 1234.5, EstimatorKind::Formula);
        assert!(text.contains("Fair price: 1234.50 LKR"));
        assert!(text.contains("Estimator: formula"));
    }

    #[test]
    fn history_marks_missing_validation() {
        let history = TrainingHistory {
            regressor: RegressorKind::Ridge,
            train_samples: 10,
            validation_samples: 0,
            epochs: vec![EpochMetrics {
                epoch: 1,
                loss: 4.0,
                mae: 2.0,
                val_loss: None,
                val_mae: None,
            }],
        };
        let text = format_training_history(&history);
        let last = text.lines().last().unwrap();
        assert!(last.ends_with('-'), "{last}");
        assert!(text.starts_with("=== Training (Ridge) ==="));
    }

    #[test]
    fn benchmark_has_one_line_per_category() {
        let subset = vec!["Painting".to_string(), "Interior Design".to_string()];
        let report = benchmark_report(&FormulaEstimator::new(), Some(&subset), BenchmarkJob::default()).unwrap();
        let text = format_benchmark(&report);
        assert_eq!(text.lines().count(), 1 + 1 + 2);
        assert!(text.lines().nth(2).unwrap().starts_with("Painting"));
    }

    #[test]
    fn infinite_difference_is_printed() {
        assert_eq!(signed_pct(f64::INFINITY), "+inf%");
        assert_eq!(signed_pct(20.0), "+20.0%");
    }

    #[test]
    fn truncate_marks_cut_labels() {
        assert_eq!(truncate("General Contracting", 12), "General Con.");
        assert_eq!(truncate("HVAC", 12), "HVAC");
    }
}
