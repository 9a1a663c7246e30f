//! Runtime configuration.
//!
//! Settings come from the process environment (optionally seeded from a `.env`
//! file via `dotenvy`). Training hyper-parameters have their own typed configs
//! with defaults; the CLI overrides them per run.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::analysis::DisputeThresholds;
use crate::domain::RegressorKind;

/// Top-level configuration for the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    /// Saved model directory used when a command doesn't pass `--model-dir`.
    pub model_dir: Option<PathBuf>,
    /// Seed for market jitter and data generation; entropy when unset.
    pub seed: Option<u64>,
    pub dispute: DisputeThresholds,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telemetry = TelemetryConfig {
            log_level: lookup("FAIRPRICE_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            ansi: parse_flag(&lookup, "FAIRPRICE_LOG_ANSI")?.unwrap_or(false),
        };
        let model_dir = lookup("FAIRPRICE_MODEL_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let seed = parse_var::<u64, _>(&lookup, "FAIRPRICE_SEED")?;

        let defaults = DisputeThresholds::default();
        let dispute = DisputeThresholds {
            fair_band_pct: parse_var(&lookup, "FAIRPRICE_FAIR_BAND_PCT")?.unwrap_or(defaults.fair_band_pct),
            client_band_pct: parse_var(&lookup, "FAIRPRICE_CLIENT_BAND_PCT")?
                .unwrap_or(defaults.client_band_pct),
            settlement_band_pct: parse_var(&lookup, "FAIRPRICE_SETTLEMENT_BAND_PCT")?
                .unwrap_or(defaults.settlement_band_pct),
        };
        if !dispute.is_valid() {
            return Err(ConfigError::InvalidThresholds);
        }

        Ok(Self {
            telemetry,
            model_dir,
            seed,
            dispute,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| ConfigError::InvalidNumber {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn parse_flag<F>(lookup: &F, key: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|raw| (raw.trim().to_ascii_lowercase(), raw)) {
        None => Ok(None),
        Some((v, _)) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(Some(true)),
        Some((v, _)) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(Some(false)),
        Some((_, raw)) => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value: raw,
        }),
    }
}

/// Logging controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset or unparsable.
    pub log_level: String,
    /// Colour codes in log lines.
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ansi: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidNumber { key: String, value: String },
    InvalidFlag { key: String, value: String },
    InvalidThresholds,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a number, got '{value}'")
            }
            ConfigError::InvalidFlag { key, value } => {
                write!(f, "{key} must be true or false, got '{value}'")
            }
            ConfigError::InvalidThresholds => {
                write!(f, "dispute thresholds must be finite and non-negative")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Hyper-parameters for a full training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub regressor: RegressorKind,
    pub epochs: usize,
    pub batch_size: usize,
    /// Trailing fraction of the samples held out for validation, in `[0, 1)`.
    pub validation_split: f64,
    pub learning_rate: f64,
    /// Hidden layer widths for the MLP.
    pub hidden_layers: Vec<usize>,
    /// L2 penalty for ridge regression.
    pub ridge_lambda: f64,
    /// Seeds weight init and batch shuffling.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            regressor: RegressorKind::Mlp,
            epochs: 50,
            batch_size: 32,
            validation_split: 0.2,
            learning_rate: 0.001,
            hidden_layers: vec![64, 32, 16],
            ridge_lambda: 1e-3,
            seed: 42,
        }
    }
}

/// Hyper-parameters for a fine-tuning pass over an already trained estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct FineTuneConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for FineTuneConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            seed: 42,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.telemetry, TelemetryConfig::default());
        assert!(config.model_dir.is_none());
        assert!(config.seed.is_none());
        assert_eq!(config.dispute, DisputeThresholds::default());
    }

    #[test]
    fn thresholds_and_seed_are_read_from_environment() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("FAIRPRICE_SEED", "7"),
            ("FAIRPRICE_FAIR_BAND_PCT", "12.5"),
            ("FAIRPRICE_MODEL_DIR", "models/latest"),
        ]))
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.dispute.fair_band_pct, 12.5);
        assert_eq!(config.dispute.client_band_pct, 15.0);
        assert_eq!(config.model_dir, Some(PathBuf::from("models/latest")));
    }

    #[test]
    fn rejects_non_numeric_values() {
        let err = AppConfig::from_lookup(lookup_from(&[("FAIRPRICE_SEED", "abc")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                key: "FAIRPRICE_SEED".to_string(),
                value: "abc".to_string()
            }
        );

        let err = AppConfig::from_lookup(lookup_from(&[("FAIRPRICE_CLIENT_BAND_PCT", "-1")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidThresholds);
    }

    #[test]
    fn telemetry_settings_are_read_from_environment() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("FAIRPRICE_LOG_LEVEL", "fair_price=debug"),
            ("FAIRPRICE_LOG_ANSI", " Yes "),
        ]))
        .unwrap();
        assert_eq!(config.telemetry.log_level, "fair_price=debug");
        assert!(config.telemetry.ansi);

        let err = AppConfig::from_lookup(lookup_from(&[("FAIRPRICE_LOG_ANSI", "colour")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidFlag {
                key: "FAIRPRICE_LOG_ANSI".to_string(),
                value: "colour".to_string()
            }
        );
    }
}
