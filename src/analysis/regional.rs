//! Same job, every known district: spread, ordering and provincial averages.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{CURRENCY, PriceQuery, Province};
use crate::error::PricingError;
use crate::estimator::FairPriceEstimator;
use crate::math::{mean, median, min_max, std_dev};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalPrice {
    pub location: String,
    pub province: Province,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvincialAverage {
    pub province: Province,
    pub avg_price: f64,
    pub locations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalReport {
    pub category: String,
    pub area_sqm: f64,
    pub complexity_score: f64,
    pub material_quality_score: f64,
    pub avg_price: f64,
    pub median_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Population standard deviation.
    pub standard_deviation: f64,
    pub price_range: f64,
    /// `max / min`; `None` when the cheapest district prices at zero.
    pub price_ratio: Option<f64>,
    pub cheapest_location: String,
    pub most_expensive_location: String,
    pub cheapest_province: Province,
    pub most_expensive_province: Province,
    /// Ascending by average price.
    pub provincial_averages: Vec<ProvincialAverage>,
    /// Ascending by price, ties broken by location label.
    pub regional_prices: Vec<RegionalPrice>,
    pub analysis_date: NaiveDate,
    pub currency: String,
}

/// Estimate one job in every location the estimator knows.
pub fn analyze_regional_pricing<E: FairPriceEstimator + ?Sized>(
    estimator: &E,
    category: &str,
    area_sqm: f64,
    complexity_score: f64,
    material_quality_score: f64,
) -> Result<RegionalReport, PricingError> {
    let locations = estimator.known_locations();
    if locations.is_empty() {
        return Err(PricingError::invalid_state("no known locations; train or load a model first"));
    }

    let query = PriceQuery::new(category, "", area_sqm, complexity_score, material_quality_score);
    let mut regional_prices = locations
        .par_iter()
        .map(|location| {
            let price = estimator.estimate(&query.at_location(location))?;
            Ok(RegionalPrice {
                location: location.clone(),
                province: Province::for_district(location),
                price,
            })
        })
        .collect::<Result<Vec<_>, PricingError>>()?;
    regional_prices.sort_by(|a, b| a.price.total_cmp(&b.price).then_with(|| a.location.cmp(&b.location)));
    debug!(category, locations = regional_prices.len(), "regional fan-out done");

    let prices: Vec<f64> = regional_prices.iter().map(|p| p.price).collect();
    let empty = || PricingError::invalid_state("regional fan-out produced no prices");
    let avg_price = mean(&prices).ok_or_else(empty)?;
    let median_price = median(&prices).ok_or_else(empty)?;
    let standard_deviation = std_dev(&prices).ok_or_else(empty)?;
    let (min_price, max_price) = min_max(&prices).ok_or_else(empty)?;

    let provincial_averages = provincial_averages(&regional_prices);
    let (cheapest, most_expensive) = match (regional_prices.first(), regional_prices.last()) {
        (Some(first), Some(last)) => (first.location.clone(), last.location.clone()),
        _ => return Err(empty()),
    };
    let (cheapest_province, most_expensive_province) =
        match (provincial_averages.first(), provincial_averages.last()) {
            (Some(first), Some(last)) => (first.province, last.province),
            _ => return Err(empty()),
        };

    info!(
        category,
        locations = prices.len(),
        min = min_price,
        max = max_price,
        "regional analysis complete"
    );

    Ok(RegionalReport {
        category: category.to_string(),
        area_sqm,
        complexity_score,
        material_quality_score,
        avg_price,
        median_price,
        min_price,
        max_price,
        standard_deviation,
        price_range: max_price - min_price,
        price_ratio: (min_price > 0.0).then(|| max_price / min_price),
        cheapest_location: cheapest,
        most_expensive_location: most_expensive,
        cheapest_province,
        most_expensive_province,
        provincial_averages,
        regional_prices,
        analysis_date: chrono::Local::now().date_naive(),
        currency: CURRENCY.to_string(),
    })
}

fn provincial_averages(prices: &[RegionalPrice]) -> Vec<ProvincialAverage> {
    let mut groups: BTreeMap<Province, (f64, usize)> = BTreeMap::new();
    for p in prices {
        let entry = groups.entry(p.province).or_insert((0.0, 0));
        entry.0 += p.price;
        entry.1 += 1;
    }
    let mut out: Vec<ProvincialAverage> = groups
        .into_iter()
        .map(|(province, (sum, count))| ProvincialAverage {
            province,
            avg_price: sum / count as f64,
            locations: count,
        })
        .collect();
    out.sort_by(|a, b| a.avg_price.total_cmp(&b.avg_price).then_with(|| a.province.cmp(&b.province)));
    out
}
