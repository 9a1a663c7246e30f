//! Saved-model directory layout.
//!
//! A model directory holds three JSON files that are only meaningful together:
//!
//! - `model.json`: the fitted `Regressor`
//! - `feature_mappings.json`: label → code tables
//! - `scaler.json`: per-dimension mean/scale
//!
//! All three are staged as `*.tmp` siblings first and renamed into place only
//! once every file serialised and wrote cleanly.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::PricingError;
use crate::features::{FeatureMapping, FeatureScaler};
use crate::models::Regressor;

pub const MODEL_FILE: &str = "model.json";
pub const MAPPINGS_FILE: &str = "feature_mappings.json";
pub const SCALER_FILE: &str = "scaler.json";

pub fn save_model(
    dir: &Path,
    mapping: &FeatureMapping,
    scaler: &FeatureScaler,
    regressor: &Regressor,
) -> Result<(), PricingError> {
    fs::create_dir_all(dir).map_err(|source| PricingError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let staged = [
        stage_json(dir, MODEL_FILE, regressor)?,
        stage_json(dir, MAPPINGS_FILE, mapping)?,
        stage_json(dir, SCALER_FILE, scaler)?,
    ];
    for (tmp, target) in &staged {
        fs::rename(tmp, target).map_err(|source| PricingError::Io {
            path: target.clone(),
            source,
        })?;
    }

    info!(dir = %dir.display(), regressor = regressor.kind().display_name(), "model saved");
    Ok(())
}

pub fn load_model(dir: &Path) -> Result<(FeatureMapping, FeatureScaler, Regressor), PricingError> {
    let regressor: Regressor = read_json(&dir.join(MODEL_FILE))?;
    let mapping: FeatureMapping = read_json(&dir.join(MAPPINGS_FILE))?;
    let scaler: FeatureScaler = read_json(&dir.join(SCALER_FILE))?;

    if mapping.is_empty() {
        return Err(PricingError::invalid_state(format!(
            "'{}' has empty feature mappings",
            dir.join(MAPPINGS_FILE).display()
        )));
    }
    if !regressor.is_consistent() {
        return Err(PricingError::invalid_state(format!(
            "'{}' does not match the feature layout",
            dir.join(MODEL_FILE).display()
        )));
    }

    info!(dir = %dir.display(), regressor = regressor.kind().display_name(), "model loaded");
    Ok((mapping, scaler, regressor))
}

/// Write `value` to `<dir>/<name>.tmp`, returning `(tmp, final)` paths.
fn stage_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<(PathBuf, PathBuf), PricingError> {
    let target = dir.join(name);
    let tmp = dir.join(format!("{name}.tmp"));
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| PricingError::Serialization {
        path: target.clone(),
        source,
    })?;
    fs::write(&tmp, bytes).map_err(|source| PricingError::Io {
        path: tmp.clone(),
        source,
    })?;
    Ok((tmp, target))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PricingError> {
    let bytes = fs::read(path).map_err(|source| PricingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| PricingError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;
    use crate::domain::{RegressorKind, TrainingSample};
    use crate::models::TrainSet;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fitted() -> (FeatureMapping, FeatureScaler, Regressor) {
        fitted_with(&TrainingConfig {
            regressor: RegressorKind::Ridge,
            ..TrainingConfig::default()
        })
    }

    fn fitted_with(config: &TrainingConfig) -> (FeatureMapping, FeatureScaler, Regressor) {
        let samples: Vec<TrainingSample> = (0..24)
            .map(|i| TrainingSample {
                category: if i % 2 == 0 { "Masonry" } else { "Roofing" }.to_string(),
                location: if i % 3 == 0 { "Kandy" } else { "Galle" }.to_string(),
                area_sqm: 10.0 + i as f64 * 5.0,
                complexity_score: 1.0 + (i % 9) as f64,
                material_quality_score: 2.0 + (i % 7) as f64,
                price: 3000.0 + 40.0 * i as f64,
            })
            .collect();
        let mut mapping = FeatureMapping::default();
        mapping.extend(&samples);
        let rows: Vec<_> = samples.iter().map(|s| mapping.encode(&s.query()).unwrap()).collect();
        let prices: Vec<f64> = samples.iter().map(|s| s.price).collect();
        let scaler = FeatureScaler::fit(&rows).unwrap();
        let scaled = scaler.transform_all(&rows);
        let mut rng = StdRng::seed_from_u64(1);
        let (regressor, _) = Regressor::fit(config, TrainSet { x: &scaled, y: &prices }, None, &mut rng).unwrap();
        (mapping, scaler, regressor)
    }

    #[test]
    fn save_writes_all_three_files_and_no_temporaries() {
        let dir = tempfile::tempdir().unwrap();
        let (mapping, scaler, regressor) = fitted();
        save_model(dir.path(), &mapping, &scaler, &regressor).unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![MAPPINGS_FILE, MODEL_FILE, SCALER_FILE]);

        let (m, s, r) = load_model(dir.path()).unwrap();
        assert_eq!(m, mapping);
        assert_eq!(s, scaler);
        assert_eq!(r.kind(), RegressorKind::Ridge);
    }

    #[test]
    fn missing_file_is_io_and_garbage_is_serialization() {
        let dir = tempfile::tempdir().unwrap();
        let (mapping, scaler, regressor) = fitted();
        save_model(dir.path(), &mapping, &scaler, &regressor).unwrap();

        fs::write(dir.path().join(SCALER_FILE), b"{ not json").unwrap();
        assert!(matches!(load_model(dir.path()), Err(PricingError::Serialization { .. })));

        fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();
        assert!(matches!(load_model(dir.path()), Err(PricingError::Io { .. })));
    }

    #[test]
    fn empty_mappings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (_, scaler, regressor) = fitted();
        save_model(dir.path(), &FeatureMapping::default(), &scaler, &regressor).unwrap();
        assert!(matches!(load_model(dir.path()), Err(PricingError::InvalidState(_))));
    }

    /// Rewrite the saved model's layer list and expect the load to refuse it.
    fn assert_layer_edit_rejected(edit: impl Fn(&mut Vec<serde_json::Value>, &mut Vec<serde_json::Value>)) {
        let dir = tempfile::tempdir().unwrap();
        let (mapping, scaler, regressor) = fitted_with(&TrainingConfig {
            epochs: 2,
            hidden_layers: vec![4, 3],
            ..TrainingConfig::default()
        });
        save_model(dir.path(), &mapping, &scaler, &regressor).unwrap();
        assert!(load_model(dir.path()).is_ok());

        let path = dir.path().join(MODEL_FILE);
        let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        let mut layers = json["layers"].as_array().unwrap().clone();
        let mut moments = json["moments"].as_array().unwrap().clone();
        edit(&mut layers, &mut moments);
        json["layers"] = serde_json::Value::Array(layers);
        json["moments"] = serde_json::Value::Array(moments);
        fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();

        assert!(matches!(load_model(dir.path()), Err(PricingError::InvalidState(_))));
    }

    #[test]
    fn missing_hidden_layer_is_rejected() {
        assert_layer_edit_rejected(|layers, moments| {
            layers.remove(1);
            moments.remove(1);
        });
    }

    #[test]
    fn missing_output_layer_is_rejected() {
        assert_layer_edit_rejected(|layers, moments| {
            layers.pop();
            moments.pop();
        });
    }

    #[test]
    fn layers_without_moments_are_rejected() {
        assert_layer_edit_rejected(|layers, _| {
            layers.remove(1);
        });
    }
}
