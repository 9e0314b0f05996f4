//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Io { path: String, message: String },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunables for one whiteboard session.
///
/// Every field has a default, so a config file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Drawing surface width in pixels.
    pub surface_width: u32,
    /// Drawing surface height in pixels.
    pub surface_height: u32,
    /// Smallest accepted view scale.
    pub min_scale: f64,
    /// Largest accepted view scale.
    pub max_scale: f64,
    /// Relative scale change per zoom step.
    pub zoom_step: f64,
    /// Keep the logical point under the zoom anchor fixed while zooming.
    pub zoom_to_anchor: bool,
    /// Maximum number of snapshots kept in history.
    pub max_history: usize,
    /// Font size per unit of stroke thickness.
    pub text_size_ratio: f64,
    /// Initial stroke color as a hex string.
    pub default_color: String,
    /// Initial stroke thickness.
    pub default_thickness: f64,
    /// TTF/OTF file for the text tool, replacing the bundled font.
    pub font_path: Option<PathBuf>,
    /// Installed font family for the text tool; ignored when `font_path` is set.
    pub font_family: Option<String>,
    /// Thumbnail width in pixels (height keeps the aspect ratio).
    pub thumbnail_width: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface_width: 1280,
            surface_height: 800,
            min_scale: 0.5,
            max_scale: 3.0,
            zoom_step: 0.1,
            zoom_to_anchor: false,
            max_history: 20,
            text_size_ratio: 5.0,
            default_color: "#000000".to_string(),
            default_thickness: 3.0,
            font_path: None,
            font_family: None,
            thumbnail_width: 200,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.surface_width == 0 || self.surface_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "surface size must be non-zero, got {}x{}",
                self.surface_width, self.surface_height
            )));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(ConfigError::Invalid(format!(
                "scale range [{}, {}] is empty or non-positive",
                self.min_scale, self.max_scale
            )));
        }
        if self.zoom_step <= 0.0 || self.zoom_step >= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "zoom_step must be in (0, 1), got {}",
                self.zoom_step
            )));
        }
        if self.max_history == 0 {
            return Err(ConfigError::Invalid("max_history must be at least 1".to_string()));
        }
        if self.default_thickness <= 0.0 || self.text_size_ratio <= 0.0 {
            return Err(ConfigError::Invalid(
                "thickness and text size ratio must be positive".to_string(),
            ));
        }
        if self.thumbnail_width == 0 {
            return Err(ConfigError::Invalid("thumbnail_width must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let config = EngineConfig::default();
        assert!((config.min_scale - 0.5).abs() < f64::EPSILON);
        assert!((config.max_scale - 3.0).abs() < f64::EPSILON);
        assert!((config.zoom_step - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.max_history, 20);
        assert!((config.text_size_ratio - 5.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "max_history": 5, "surface_width": 64 }"#).unwrap();
        assert_eq!(config.max_history, 5);
        assert_eq!(config.surface_width, 64);
        assert_eq!(config.surface_height, 800);
    }

    #[test]
    fn test_rejects_inverted_scale_range() {
        let result = EngineConfig::from_json(r#"{ "min_scale": 4.0, "max_scale": 2.0 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_history() {
        let result = EngineConfig::from_json(r#"{ "max_history": 0 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = EngineConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "zoom_to_anchor": true }"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert!(config.zoom_to_anchor);
        assert!(config.font_path.is_none());
        assert!(config.font_family.is_none());

        let missing = EngineConfig::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
