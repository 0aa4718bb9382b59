//! geoflux configuration file handling

use anyhow::{Context, Result};
use geoflux_animation::DriverConfig;
use geoflux_app::headless_runtime::HeadlessRunConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration (geoflux.toml)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeofluxConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub headless: HeadlessConfig,
}

/// Headless run settings
#[derive(Debug, Deserialize, Serialize)]
pub struct HeadlessConfig {
    /// Logical milliseconds between frames
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_tick_ms() -> u64 {
    16
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl GeofluxConfig {
    /// Load configuration from a file, or from geoflux.toml inside a directory
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = if path.is_dir() {
            path.join("geoflux.toml")
        } else {
            path.to_path_buf()
        };

        if !config_path.exists() {
            anyhow::bail!(
                "No config found at {}. Run `geoflux init` to create one.",
                config_path.display()
            );
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: GeofluxConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        config
            .driver
            .validate()
            .with_context(|| format!("Invalid driver settings in {}", config_path.display()))?;

        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn runtime(&self) -> HeadlessRunConfig {
        HeadlessRunConfig {
            tick_ms: self.headless.tick_ms,
            ..Default::default()
        }
    }
}
