use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ValidationError;

/// Plain values consumed by the core. Missing keys in a config file fall
/// back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chunk_duration_seconds: f64,
    pub padding_seconds: f64,
    pub min_region_seconds: f64,
    pub inference_url: String,
    pub request_timeout_secs: f64,
    /// End time of a click marker is `begin + click_epsilon_seconds`.
    pub click_epsilon_seconds: f64,
    pub viewport_width_px: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_duration_seconds: 5.0,
            padding_seconds: 3.0,
            min_region_seconds: crate::kernel::region::MIN_REGION_SECONDS,
            inference_url: "http://localhost:8000/predict".to_string(),
            request_timeout_secs: 15.0,
            click_epsilon_seconds: 0.01,
            viewport_width_px: 1000.0,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("chunk_duration_seconds", self.chunk_duration_seconds),
            ("min_region_seconds", self.min_region_seconds),
            ("request_timeout_secs", self.request_timeout_secs),
            ("viewport_width_px", self.viewport_width_px),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !self.padding_seconds.is_finite() || self.padding_seconds < 0.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "padding_seconds must be >= 0, got {}",
                self.padding_seconds
            )));
        }
        if !self.click_epsilon_seconds.is_finite() || self.click_epsilon_seconds < 0.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "click_epsilon_seconds must be >= 0, got {}",
                self.click_epsilon_seconds
            )));
        }
        if self.inference_url.trim().is_empty() {
            return Err(ValidationError::InvalidConfig(
                "inference_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = Config::from_toml_str("chunk_duration_seconds = 2.5\n").unwrap();
        assert_eq!(cfg.chunk_duration_seconds, 2.5);
        assert_eq!(cfg.padding_seconds, 3.0);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(15));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_chunk_duration() {
        let cfg = Config {
            chunk_duration_seconds: 0.0,
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::InvalidConfig(_))
        ));
    }
}
