use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::random_batch::{BatchSpec, MAX_DECIMALS};
use crate::types::Baseline;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("batch range is not finite: min={min} max={max}")]
    NonFiniteRange { min: f64, max: f64 },
    #[error("batch min {min} is greater than max {max}")]
    InvertedRange { min: f64, max: f64 },
    #[error("batch decimals {decimals} exceeds the maximum of {max}")]
    TooManyDecimals { decimals: u32, max: u32 },
    #[error("no value with {decimals} decimals lies in [{min}, {max}]")]
    NoValueAtPrecision { min: f64, max: f64, decimals: u32 },
}

/// Session defaults: the starting baseline and the random-batch shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub baseline: Baseline,
    pub batch: BatchSpec,
}

impl SimConfig {
    /// Parse a JSON document. Missing fields fall back to defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Only the batch shape is checked; a zero or non-finite baseline is
    /// allowed and simply leaves the controls disabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let BatchSpec { min, max, decimals, .. } = self.batch;
        if !min.is_finite() || !max.is_finite() {
            return Err(ConfigError::NonFiniteRange { min, max });
        }
        if min > max {
            return Err(ConfigError::InvertedRange { min, max });
        }
        if decimals > MAX_DECIMALS {
            return Err(ConfigError::TooManyDecimals { decimals, max: MAX_DECIMALS });
        }
        if self.batch.bounds_at_precision().is_none() {
            return Err(ConfigError::NoValueAtPrecision { min, max, decimals });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_form() {
        let c = SimConfig::default();
        assert_eq!(c.baseline, Baseline::new(100.0, 50.0, 10.0));
        assert_eq!(c.batch, BatchSpec { min: -5.0, max: 5.0, count: 5, decimals: 2 });
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_given_fields() {
        let c = SimConfig::from_json_str(r#"{"baseline":{"primary":250.0,"leveraged":12.5,"position_size":40.0},"batch":{"count":8}}"#)
            .unwrap();
        assert_eq!(c.baseline.primary, 250.0);
        assert_eq!(c.batch.count, 8);
        assert_eq!(c.batch.min, -5.0);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = SimConfig::from_json_str(r#"{"batch":{"min":3.0,"max":-3.0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvertedRange { .. }));
    }

    #[test]
    fn oversized_decimals_are_rejected() {
        let err = SimConfig::from_json_str(r#"{"batch":{"decimals":320}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::TooManyDecimals { decimals: 320, max: 15 }));

        let mut c = SimConfig::default();
        c.batch.decimals = MAX_DECIMALS;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn range_without_a_value_at_precision_is_rejected() {
        let err = SimConfig::from_json_str(r#"{"batch":{"min":0.3,"max":0.4,"decimals":0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoValueAtPrecision { .. }));

        let ok = SimConfig::from_json_str(r#"{"batch":{"min":0.3,"max":0.4,"decimals":1}}"#);
        assert!(ok.is_ok());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(SimConfig::from_json_str("{"), Err(ConfigError::Parse(_))));
    }
}
