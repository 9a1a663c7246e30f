//! Append-only label → code tables.
//!
//! Codes are dense (`0..len`) and assigned in first-seen order. Once a label has
//! a code it keeps it for the lifetime of the estimator (and across save/load),
//! otherwise a saved model would silently read categories as the wrong trade.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::{PriceQuery, TrainingSample};
use crate::error::PricingError;
use crate::features::FeatureRow;

/// A single label table.
///
/// Persisted as a `{label: code}` object; loading validates that the codes are
/// exactly `0..len`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, usize>", into = "BTreeMap<String, usize>")]
pub struct LabelCodes {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelCodes {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in code order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn code(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Code for `label`, or code 0 for a label never seen.
    ///
    /// Returns `None` only when the table is empty.
    pub fn resolve(&self, label: &str) -> Option<usize> {
        if self.labels.is_empty() {
            return None;
        }
        Some(self.code(label).unwrap_or(0))
    }

    /// Label that `label` resolves to after the unknown-label fallback.
    pub fn resolve_label(&self, label: &str) -> Option<&str> {
        self.resolve(label).map(|code| self.labels[code].as_str())
    }

    /// Append `label` if unseen. Returns its code either way.
    pub fn insert(&mut self, label: &str) -> usize {
        if let Some(code) = self.code(label) {
            return code;
        }
        let code = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), code);
        code
    }
}

impl TryFrom<BTreeMap<String, usize>> for LabelCodes {
    type Error = String;

    fn try_from(value: BTreeMap<String, usize>) -> Result<Self, Self::Error> {
        let mut slots: Vec<Option<String>> = vec![None; value.len()];
        for (label, code) in value {
            let Some(slot) = slots.get_mut(code) else {
                return Err(format!("code {code} for '{label}' is out of range"));
            };
            if slot.is_some() {
                return Err(format!("code {code} is assigned twice"));
            }
            *slot = Some(label);
        }

        let mut out = LabelCodes::default();
        for slot in slots {
            // Length and uniqueness checks above guarantee every slot is filled.
            if let Some(label) = slot {
                out.insert(&label);
            }
        }
        Ok(out)
    }
}

impl From<LabelCodes> for BTreeMap<String, usize> {
    fn from(value: LabelCodes) -> Self {
        value.index.into_iter().collect()
    }
}

/// Category and location tables owned by a trained estimator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMapping {
    pub category: LabelCodes,
    pub location: LabelCodes,
}

impl FeatureMapping {
    pub fn is_empty(&self) -> bool {
        self.category.is_empty() || self.location.is_empty()
    }

    /// Append every unseen category/location label in `samples`.
    ///
    /// Returns the number of labels added.
    pub fn extend(&mut self, samples: &[TrainingSample]) -> usize {
        let before = self.category.len() + self.location.len();
        for s in samples {
            self.category.insert(&s.category);
        }
        for s in samples {
            self.location.insert(&s.location);
        }
        self.category.len() + self.location.len() - before
    }

    /// Encode a query into its raw (unscaled) feature row.
    ///
    /// Unknown labels alias to code 0. Fails only when a table is empty.
    pub fn encode(&self, query: &PriceQuery) -> Result<FeatureRow, PricingError> {
        let category = self
            .category
            .resolve(&query.category)
            .ok_or_else(|| PricingError::invalid_state("category mapping is empty"))?;
        let location = self
            .location
            .resolve(&query.location)
            .ok_or_else(|| PricingError::invalid_state("location mapping is empty"))?;

        Ok([
            category as f64,
            location as f64,
            query.area_sqm,
            query.complexity_score,
            query.material_quality_score,
        ])
    }
}
