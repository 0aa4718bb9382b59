//! Frame driver configuration (driver.toml)

use crate::tween::validate_duration;
use serde::{Deserialize, Serialize};

/// Frame driver settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Upper bound for one tick's delta, in milliseconds
    pub max_frame_ms: f32,
    /// Seed for per-feature phase offsets
    pub seed: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_frame_ms: 100.0,
            seed: 0x5EED_0F_F1A7,
        }
    }
}

impl DriverConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> geoflux_core::Result<()> {
        validate_duration(self.max_frame_ms)?;
        Ok(())
    }

    /// Builder: set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: set the delta clamp
    pub fn with_max_frame_ms(mut self, max_frame_ms: f32) -> Self {
        self.max_frame_ms = max_frame_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DriverConfig::from_toml("seed = 7\n").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_frame_ms, 100.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = DriverConfig::default().with_max_frame_ms(50.0);
        let text = config.to_toml().unwrap();
        assert_eq!(DriverConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_non_positive_clamp() {
        let config = DriverConfig::default().with_max_frame_ms(0.0);
        assert!(config.validate().is_err());
        assert!(DriverConfig::from_toml("max_frame_ms = \"fast\"").is_err());
    }
}
