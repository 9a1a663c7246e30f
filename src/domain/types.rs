//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during training and estimation
//! - exported to JSON/CSV
//! - reloaded later alongside a saved model

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Currency every price in this crate is quoted in.
pub const CURRENCY: &str = "LKR";

/// Construction trade.
///
/// Each trade carries the reference numbers used by the market-rate heuristic,
/// the synthetic generator and the closed-form estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Masonry,
    Carpentry,
    Plumbing,
    Electrical,
    Painting,
    Tiling,
    Roofing,
    FoundationWork,
    InteriorDesign,
    Landscaping,
    Hvac,
    GeneralContracting,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Masonry,
        Category::Carpentry,
        Category::Plumbing,
        Category::Electrical,
        Category::Painting,
        Category::Tiling,
        Category::Roofing,
        Category::FoundationWork,
        Category::InteriorDesign,
        Category::Landscaping,
        Category::Hvac,
        Category::GeneralContracting,
    ];

    /// Label used in queries, CSV files and reports.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Masonry => "Masonry",
            Category::Carpentry => "Carpentry",
            Category::Plumbing => "Plumbing",
            Category::Electrical => "Electrical",
            Category::Painting => "Painting",
            Category::Tiling => "Tiling",
            Category::Roofing => "Roofing",
            Category::FoundationWork => "Foundation Work",
            Category::InteriorDesign => "Interior Design",
            Category::Landscaping => "Landscaping",
            Category::Hvac => "HVAC",
            Category::GeneralContracting => "General Contracting",
        }
    }

    /// Exact (case-sensitive) label lookup.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.display_name() == label)
    }

    /// Typical day rate in LKR.
    pub fn base_rate(self) -> f64 {
        match self {
            Category::Masonry => 3200.0,
            Category::Carpentry => 3800.0,
            Category::Plumbing => 4200.0,
            Category::Electrical => 4500.0,
            Category::Painting => 3000.0,
            Category::Tiling => 3400.0,
            Category::Roofing => 4200.0,
            Category::FoundationWork => 5500.0,
            Category::InteriorDesign => 7500.0,
            Category::Landscaping => 3600.0,
            Category::Hvac => 6000.0,
            Category::GeneralContracting => 5000.0,
        }
    }

    /// Share of the total price that is material cost (0..1).
    pub fn material_share(self) -> f64 {
        match self {
            Category::Masonry => 0.65,
            Category::Carpentry => 0.60,
            Category::Plumbing => 0.55,
            Category::Electrical => 0.60,
            Category::Painting => 0.50,
            Category::Tiling => 0.70,
            Category::Roofing => 0.75,
            Category::FoundationWork => 0.70,
            Category::InteriorDesign => 0.50,
            Category::Landscaping => 0.55,
            Category::Hvac => 0.65,
            Category::GeneralContracting => 0.60,
        }
    }

    /// LKR per m^0.85 of job area.
    pub fn area_impact(self) -> f64 {
        match self {
            Category::Masonry => 0.5,
            Category::Carpentry => 0.4,
            Category::Plumbing => 0.3,
            Category::Electrical => 0.25,
            Category::Painting => 0.6,
            Category::Tiling => 0.7,
            Category::Roofing => 0.55,
            Category::FoundationWork => 0.45,
            Category::InteriorDesign => 0.3,
            Category::Landscaping => 0.5,
            Category::Hvac => 0.35,
            Category::GeneralContracting => 0.4,
        }
    }

    /// Realistic job area range in m² as `(min, max)`.
    pub fn area_range(self) -> (f64, f64) {
        match self {
            Category::Masonry => (10.0, 300.0),
            Category::Carpentry => (5.0, 150.0),
            Category::Plumbing => (5.0, 100.0),
            Category::Electrical => (10.0, 200.0),
            Category::Painting => (20.0, 400.0),
            Category::Tiling => (10.0, 200.0),
            Category::Roofing => (20.0, 300.0),
            Category::FoundationWork => (20.0, 200.0),
            Category::InteriorDesign => (30.0, 250.0),
            Category::Landscaping => (50.0, 1000.0),
            Category::Hvac => (20.0, 300.0),
            Category::GeneralContracting => (50.0, 500.0),
        }
    }
}

/// Administrative district with a cost-of-living multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    Colombo,
    Gampaha,
    Kandy,
    Galle,
    Jaffna,
    Anuradhapura,
    Batticaloa,
    Trincomalee,
    Matara,
    Kurunegala,
    Ratnapura,
    Badulla,
    Negombo,
    NuwaraEliya,
    Hambantota,
    Kalmunai,
    Vavuniya,
    Matale,
    Puttalam,
    Kegalle,
}

impl Location {
    pub const ALL: [Location; 20] = [
        Location::Colombo,
        Location::Gampaha,
        Location::Kandy,
        Location::Galle,
        Location::Jaffna,
        Location::Anuradhapura,
        Location::Batticaloa,
        Location::Trincomalee,
        Location::Matara,
        Location::Kurunegala,
        Location::Ratnapura,
        Location::Badulla,
        Location::Negombo,
        Location::NuwaraEliya,
        Location::Hambantota,
        Location::Kalmunai,
        Location::Vavuniya,
        Location::Matale,
        Location::Puttalam,
        Location::Kegalle,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Location::Colombo => "Colombo",
            Location::Gampaha => "Gampaha",
            Location::Kandy => "Kandy",
            Location::Galle => "Galle",
            Location::Jaffna => "Jaffna",
            Location::Anuradhapura => "Anuradhapura",
            Location::Batticaloa => "Batticaloa",
            Location::Trincomalee => "Trincomalee",
            Location::Matara => "Matara",
            Location::Kurunegala => "Kurunegala",
            Location::Ratnapura => "Ratnapura",
            Location::Badulla => "Badulla",
            Location::Negombo => "Negombo",
            Location::NuwaraEliya => "Nuwara Eliya",
            Location::Hambantota => "Hambantota",
            Location::Kalmunai => "Kalmunai",
            Location::Vavuniya => "Vavuniya",
            Location::Matale => "Matale",
            Location::Puttalam => "Puttalam",
            Location::Kegalle => "Kegalle",
        }
    }

    pub fn from_label(label: &str) -> Option<Location> {
        Location::ALL.into_iter().find(|l| l.display_name() == label)
    }

    /// Cost-of-living multiplier applied to day rates.
    pub fn cost_factor(self) -> f64 {
        match self {
            Location::Colombo => 1.35,
            Location::Gampaha => 1.25,
            Location::Kandy => 1.20,
            Location::Galle => 1.15,
            Location::Negombo => 1.20,
            Location::Jaffna => 1.10,
            Location::Anuradhapura => 0.95,
            Location::Batticaloa => 0.90,
            Location::Trincomalee => 0.92,
            Location::Matara => 1.05,
            Location::Kurunegala => 0.98,
            Location::Ratnapura => 0.95,
            Location::Badulla => 0.92,
            Location::NuwaraEliya => 1.10,
            Location::Hambantota => 1.05,
            Location::Kalmunai => 0.88,
            Location::Vavuniya => 0.90,
            Location::Matale => 0.95,
            Location::Puttalam => 0.90,
            Location::Kegalle => 0.92,
        }
    }

    pub fn province(self) -> Province {
        Province::for_district(self.display_name())
    }
}

/// Province grouping used by the regional analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Province {
    Western,
    Central,
    Southern,
    Northern,
    Eastern,
    #[serde(rename = "North Western")]
    NorthWestern,
    #[serde(rename = "North Central")]
    NorthCentral,
    Uva,
    Sabaragamuwa,
    Unknown,
}

impl Province {
    pub fn display_name(self) -> &'static str {
        match self {
            Province::Western => "Western",
            Province::Central => "Central",
            Province::Southern => "Southern",
            Province::Northern => "Northern",
            Province::Eastern => "Eastern",
            Province::NorthWestern => "North Western",
            Province::NorthCentral => "North Central",
            Province::Uva => "Uva",
            Province::Sabaragamuwa => "Sabaragamuwa",
            Province::Unknown => "Unknown",
        }
    }

    /// Province of a district label.
    ///
    /// Covers districts that are not part of the `Location` table too, since
    /// trained mappings may carry labels the reference tables don't know.
    pub fn for_district(label: &str) -> Province {
        match label {
            "Colombo" | "Gampaha" | "Kalutara" | "Negombo" => Province::Western,
            "Kandy" | "Matale" | "Nuwara Eliya" => Province::Central,
            "Galle" | "Matara" | "Hambantota" => Province::Southern,
            "Jaffna" | "Vavuniya" | "Mannar" | "Mullaitivu" | "Kilinochchi" => Province::Northern,
            "Batticaloa" | "Trincomalee" | "Ampara" | "Kalmunai" => Province::Eastern,
            "Kurunegala" | "Puttalam" => Province::NorthWestern,
            "Anuradhapura" | "Polonnaruwa" => Province::NorthCentral,
            "Badulla" | "Monaragala" => Province::Uva,
            "Ratnapura" | "Kegalle" => Province::Sabaragamuwa,
            _ => Province::Unknown,
        }
    }
}

impl std::fmt::Display for Province {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A single estimation request.
///
/// Labels are free text: unseen labels are representable and resolved by the
/// estimator (see `features::FeatureMapping::encode`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuery {
    pub category: String,
    pub location: String,
    pub area_sqm: f64,
    /// Job difficulty, nominally 1-10.
    pub complexity_score: f64,
    /// Material grade, nominally 1-10.
    pub material_quality_score: f64,
}

impl PriceQuery {
    pub fn new(
        category: impl Into<String>,
        location: impl Into<String>,
        area_sqm: f64,
        complexity_score: f64,
        material_quality_score: f64,
    ) -> Self {
        Self {
            category: category.into(),
            location: location.into(),
            area_sqm,
            complexity_score,
            material_quality_score,
        }
    }

    /// Same job, different district.
    pub fn at_location(&self, location: &str) -> Self {
        Self {
            location: location.to_string(),
            ..self.clone()
        }
    }
}

/// One labelled row used to fit a trained estimator.
///
/// Field names double as the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub category: String,
    pub location: String,
    pub area_sqm: f64,
    pub complexity_score: f64,
    pub material_quality_score: f64,
    pub price: f64,
}

impl TrainingSample {
    pub fn query(&self) -> PriceQuery {
        PriceQuery::new(
            self.category.clone(),
            self.location.clone(),
            self.area_sqm,
            self.complexity_score,
            self.material_quality_score,
        )
    }
}

/// Which regression model a trained estimator uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RegressorKind {
    /// Small dense ReLU network trained with Adam.
    Mlp,
    /// Ridge regression over a quadratic feature expansion.
    Ridge,
}

impl RegressorKind {
    pub fn display_name(self) -> &'static str {
        match self {
            RegressorKind::Mlp => "MLP",
            RegressorKind::Ridge => "Ridge",
        }
    }
}

/// Estimation strategy behind `FairPriceEstimator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    Formula,
    Trained(RegressorKind),
    /// A model-backed estimator that has not been trained or loaded yet.
    Untrained,
}

impl std::fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimatorKind::Formula => f.write_str("formula"),
            EstimatorKind::Trained(kind) => write!(f, "trained ({})", kind.display_name()),
            EstimatorKind::Untrained => f.write_str("untrained"),
        }
    }
}

/// Loss/error for one pass over the training data.
///
/// Losses are mean squared errors and `mae` mean absolute errors, both in
/// price units (LKR), so epochs are comparable across regressors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f64,
    pub mae: f64,
    pub val_loss: Option<f64>,
    pub val_mae: Option<f64>,
}

/// Diagnostics returned by `train` / `fine_tune`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub regressor: RegressorKind,
    pub train_samples: usize,
    pub validation_samples: usize,
    pub epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn final_epoch(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

/// Hold-out quality of a trained estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub n: usize,
    pub mean_squared_error: f64,
    pub mean_absolute_error: f64,
    /// Percent; rows priced at zero are left out.
    pub mean_absolute_percentage_error: f64,
    pub r_squared: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_lookup() {
        for c in Category::ALL {
            assert_eq!(Category::from_label(c.display_name()), Some(c));
        }
        for l in Location::ALL {
            assert_eq!(Location::from_label(l.display_name()), Some(l));
        }
        assert_eq!(Category::from_label("masonry"), None);
    }

    #[test]
    fn every_location_has_a_province() {
        for l in Location::ALL {
            assert_ne!(l.province(), Province::Unknown, "{} has no province", l.display_name());
        }
        assert_eq!(Province::for_district("Kalutara"), Province::Western);
        assert_eq!(Province::for_district("Atlantis"), Province::Unknown);
    }

    #[test]
    fn area_ranges_are_ordered() {
        for c in Category::ALL {
            let (lo, hi) = c.area_range();
            assert!(lo > 0.0 && hi > lo, "{}", c.display_name());
        }
    }
}
