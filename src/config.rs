//! Configuration persistence for qrpeek settings

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::capture::InversionPolicy;

/// Serializable color representation for config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for ShapeColor {
    fn default() -> Self {
        // #FF3B58
        Self {
            r: 1.0,
            g: 59.0 / 255.0,
            b: 88.0 / 255.0,
        }
    }
}

impl ShapeColor {
    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            255,
        ]
    }
}

/// Which way the preferred camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Facing {
    /// Away from the user (rear camera)
    #[default]
    Environment,
    /// Towards the user (front camera)
    User,
    /// First camera found
    Any,
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrPeekConfig {
    /// Polarities handed to the decoder
    pub inversion: InversionPolicy,
    /// Explicit camera device (path such as /dev/video2, or display name)
    pub camera_device: Option<String>,
    /// Preferred camera direction when no device is configured
    pub camera_facing: Facing,
    /// Requested frame width; the camera may deliver another size
    pub camera_width: u32,
    /// Requested frame height
    pub camera_height: u32,
    /// Give up waiting for the camera to start after this long (None = wait forever)
    pub camera_start_timeout_ms: Option<u64>,
    /// Color of the boundary drawn around a detected code
    pub boundary_color: ShapeColor,
    /// Boundary line width in pixels
    pub boundary_width: f32,
    /// Radius of the corner markers in pixels
    pub corner_radius: f32,
    /// Emit clickable terminal hyperlinks for URL payloads
    pub hyperlinks: bool,
}

impl Default for QrPeekConfig {
    fn default() -> Self {
        Self {
            inversion: InversionPolicy::DontInvert,
            camera_device: None,
            camera_facing: Facing::Environment,
            camera_width: 1280,
            camera_height: 720,
            camera_start_timeout_ms: None,
            boundary_color: ShapeColor::default(),
            boundary_width: 4.0,
            corner_radius: 8.0,
            hyperlinks: true,
        }
    }
}

impl QrPeekConfig {
    /// Application directory name under the user config dir
    pub const ID: &'static str = "qrpeek";

    /// Default location of the config file
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        match Self::path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => config,
                Err(err) => {
                    log::warn!("Error loading config, using defaults: {:?}", err);
                    Self::default()
                }
            },
            Some(_) => Self::default(),
            None => {
                log::warn!("Could not locate config directory, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::path() else {
            log::error!("Could not locate config directory for saving");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:?}", err);
        }
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_boundary_color() {
        assert_eq!(ShapeColor::default().to_rgba_u8(), [0xFF, 0x3B, 0x58, 255]);
    }

    #[test]
    fn test_defaults_match_camera_request() {
        let config = QrPeekConfig::default();
        assert_eq!((config.camera_width, config.camera_height), (1280, 720));
        assert_eq!(config.camera_facing, Facing::Environment);
        assert_eq!(config.inversion, InversionPolicy::DontInvert);
        assert!(config.camera_start_timeout_ms.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = QrPeekConfig {
            inversion: InversionPolicy::AttemptBoth,
            camera_device: Some("/dev/video2".into()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(QrPeekConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "inversion": "invert-first", "hyperlinks": false }"#).unwrap();

        let config = QrPeekConfig::load_from(&path).unwrap();
        assert_eq!(config.inversion, InversionPolicy::InvertFirst);
        assert!(!config.hyperlinks);
        assert_eq!(config.camera_width, 1280);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(QrPeekConfig::load_from(&path).is_err());
    }
}
