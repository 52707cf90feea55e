//! Configuration for placement batches.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::Point3;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Tuning knobs for the template cache and the placement transform.
#[derive(Debug, Clone)]
pub struct PlacementConfig {
    /// Absolute tolerance under which a requested scale counts as unit
    /// scale and no scale transform is applied.
    pub scale_tolerance: f64,

    /// Neutral reference point templates are staged at.
    pub staging_point: Point3,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            scale_tolerance: 1e-4,
            staging_point: Point3::ORIGIN,
        }
    }
}

/// TOML structure for deserializing a config file
#[derive(Deserialize)]
struct TomlConfig {
    placement: Option<TomlPlacement>,
}

#[derive(Deserialize)]
struct TomlPlacement {
    scale_tolerance: Option<f64>,
    staging_point: Option<[f64; 3]>,
}

impl PlacementConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unit-scale tolerance
    pub fn with_scale_tolerance(mut self, tolerance: f64) -> Self {
        self.scale_tolerance = tolerance;
        self
    }

    /// Set the staging reference point
    pub fn with_staging_point(mut self, point: Point3) -> Self {
        self.staging_point = point;
        self
    }

    /// Load configuration from a TOML file; missing keys keep their
    /// defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();
        if let Some(placement) = parsed.placement {
            if let Some(tolerance) = placement.scale_tolerance {
                config.scale_tolerance = tolerance;
            }
            if let Some([x, y, z]) = placement.staging_point {
                config.staging_point = Point3::new(x, y, z);
            }
        }
        Ok(config)
    }
}
