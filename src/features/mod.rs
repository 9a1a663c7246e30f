//! Feature encoding and scaling.
//!
//! A `PriceQuery` becomes a fixed 5-dimensional vector:
//!
//! ```text
//! [category_code, location_code, area_sqm, complexity_score, material_quality_score]
//! ```
//!
//! The label codes come from an append-only `FeatureMapping`; the vector is then
//! standardised with a `FeatureScaler` fitted once at training time.

pub mod mapping;
pub mod scaler;

pub use mapping::*;
pub use scaler::*;

/// Width of the encoded feature vector.
pub const FEATURE_DIM: usize = 5;

/// One encoded (or scaled) feature row.
pub type FeatureRow = [f64; FEATURE_DIM];
