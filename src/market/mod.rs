//! Simulated market-rate snapshots.
//!
//! This is not measured market data. A snapshot is built from the reference
//! tables plus bounded jitter drawn from the caller's RNG:
//!
//! - material cost variation: ±5%, weighted by the trade's material share
//! - supply/demand band: min/max at ±10% of the material-adjusted rate
//! - average: ±2% around the material-adjusted rate
//!
//! Pass a seeded `StdRng` for reproducible snapshots.

use chrono::{Local, NaiveDate};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::domain::{CURRENCY, Category, Location};

/// Day rate used when the category is not in the reference table.
pub const DEFAULT_BASE_RATE: f64 = 4000.0;
pub const DEFAULT_MATERIAL_SHARE: f64 = 0.60;
pub const DEFAULT_LOCATION_FACTOR: f64 = 1.0;

const MATERIAL_VARIATION: f64 = 0.05;
const SUPPLY_DEMAND_BAND: f64 = 0.10;
const AVERAGE_NOISE: f64 = 0.02;
const SAMPLE_SIZE_RANGE: (u32, u32) = (25, 150);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialTrend {
    Stable,
    Rising,
    Falling,
}

impl MaterialTrend {
    pub const ALL: [MaterialTrend; 3] = [MaterialTrend::Stable, MaterialTrend::Rising, MaterialTrend::Falling];
}

/// Market snapshot for one category/location pair. Regenerated on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRateInfo {
    pub category: String,
    pub location: String,
    pub base_rate: f64,
    pub location_factor: f64,
    /// Material share of the price, in percent.
    pub material_cost_percentage: f64,
    pub adjusted_rate: f64,
    pub min_market_rate: f64,
    pub max_market_rate: f64,
    pub avg_market_rate: f64,
    /// Simulated number of quotes behind the snapshot.
    pub sample_size: u32,
    pub material_cost_trend: MaterialTrend,
    pub last_updated: NaiveDate,
    pub currency: String,
    pub unit: String,
}

/// Build a market snapshot for `category` at `location`.
///
/// Unknown labels fall back to `DEFAULT_BASE_RATE`, `DEFAULT_MATERIAL_SHARE` and
/// `DEFAULT_LOCATION_FACTOR`; the labels are echoed back unchanged.
pub fn market_rates<R: Rng + ?Sized>(category: &str, location: &str, rng: &mut R) -> MarketRateInfo {
    let known_category = Category::from_label(category);
    let base_rate = known_category.map_or(DEFAULT_BASE_RATE, Category::base_rate);
    let material_share = known_category.map_or(DEFAULT_MATERIAL_SHARE, Category::material_share);
    let location_factor = Location::from_label(location).map_or(DEFAULT_LOCATION_FACTOR, Location::cost_factor);

    let adjusted_rate = base_rate * location_factor;

    let variation = rng.gen_range((1.0 - MATERIAL_VARIATION)..=(1.0 + MATERIAL_VARIATION));
    let material_adjusted = adjusted_rate * (1.0 + (variation - 1.0) * material_share);

    let min_market_rate = material_adjusted * (1.0 - SUPPLY_DEMAND_BAND);
    let max_market_rate = material_adjusted * (1.0 + SUPPLY_DEMAND_BAND);
    let avg_market_rate =
        material_adjusted * rng.gen_range((1.0 - AVERAGE_NOISE)..=(1.0 + AVERAGE_NOISE));

    let sample_size = rng.gen_range(SAMPLE_SIZE_RANGE.0..=SAMPLE_SIZE_RANGE.1);
    let material_cost_trend = *MaterialTrend::ALL.choose(rng).unwrap_or(&MaterialTrend::Stable);

    MarketRateInfo {
        category: category.to_string(),
        location: location.to_string(),
        base_rate,
        location_factor,
        material_cost_percentage: material_share * 100.0,
        adjusted_rate,
        min_market_rate,
        max_market_rate,
        avg_market_rate,
        sample_size,
        material_cost_trend,
        last_updated: Local::now().date_naive(),
        currency: CURRENCY.to_string(),
        unit: "per day".to_string(),
    }
}
