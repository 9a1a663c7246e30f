use std::fmt;
use std::path::PathBuf;

/// Errors raised by the estimation core.
#[derive(Debug)]
pub enum PricingError {
    /// The estimator is missing state it needs (no trained model, empty mappings).
    InvalidState(String),
    /// Caller-supplied parameters that cannot be used (empty batch, bad split).
    InvalidInput(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
}

impl PricingError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingError::InvalidState(msg) => write!(f, "invalid estimator state: {msg}"),
            PricingError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            PricingError::Io { path, source } => write!(f, "io error on '{}': {source}", path.display()),
            PricingError::Serialization { path, source } => {
                write!(f, "malformed JSON in '{}': {source}", path.display())
            }
            PricingError::Csv { path, source } => write!(f, "csv error in '{}': {source}", path.display()),
        }
    }
}

impl std::error::Error for PricingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PricingError::InvalidState(_) | PricingError::InvalidInput(_) => None,
            PricingError::Io { source, .. } => Some(source),
            PricingError::Serialization { source, .. } => Some(source),
            PricingError::Csv { source, .. } => Some(source),
        }
    }
}

/// Error surfaced by the `fairprice` binary, carrying its process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<PricingError> for AppError {
    fn from(value: PricingError) -> Self {
        let exit_code = match value {
            PricingError::InvalidInput(_) => 2,
            PricingError::Io { .. } | PricingError::Serialization { .. } | PricingError::Csv { .. } => 3,
            PricingError::InvalidState(_) => 4,
        };
        Self::new(exit_code, value.to_string())
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(value: crate::config::ConfigError) -> Self {
        Self::new(2, format!("configuration error: {value}"))
    }
}

impl From<crate::telemetry::TelemetryError> for AppError {
    fn from(value: crate::telemetry::TelemetryError) -> Self {
        Self::new(1, value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_errors_map_to_exit_codes() {
        let state: AppError = PricingError::invalid_state("no model").into();
        assert_eq!(state.exit_code(), 4);
        assert!(state.to_string().contains("no model"));

        let input: AppError = PricingError::invalid_input("empty batch").into();
        assert_eq!(input.exit_code(), 2);
    }
}
