//! Configuration persistence for dataset-annotator settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Serializable color representation for config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for ShapeColor {
    fn default() -> Self {
        // Pure red, the dataset's arrow color
        Self {
            r: 1.0,
            g: 0.0,
            b: 0.0,
        }
    }
}

impl ShapeColor {
    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ]
    }
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the `originals` and `datasets` folders
    pub storage_root: PathBuf,
    /// Crop boxes must exceed this many display pixels on both sides
    pub min_crop_size: f32,
    /// Color of arrows burned into saved images
    pub arrow_color: ShapeColor,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("storage"),
            min_crop_size: 10.0,
            arrow_color: ShapeColor::default(),
        }
    }
}

impl AppConfig {
    /// Directory name under the user's config dir
    pub const ID: &'static str = "dataset-annotator";

    /// Default location: `<config_dir>/dataset-annotator/config.json`
    pub fn file_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        match Self::file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(_) => Self::default(),
            None => {
                log::warn!("Could not resolve config directory, using defaults");
                Self::default()
            }
        }
    }

    /// Load from a specific file, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match Self::read(path) {
            Ok(config) => config.sanitized(),
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Replace values that would break the session with their defaults
    fn sanitized(mut self) -> Self {
        if !self.min_crop_size.is_finite() || self.min_crop_size < 0.0 {
            log::warn!(
                "Ignoring invalid min_crop_size {}, using default",
                self.min_crop_size
            );
            self.min_crop_size = Self::default().min_crop_size;
        }
        self
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::file_path() else {
            log::error!("Could not resolve config directory for saving");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:?}", err);
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
