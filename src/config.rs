// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{CameraBackendType, Facing};
use crate::constants::{APP_DIR_NAME, preview};
use crate::errors::ConfigError;
use crate::pipelines::photo::EncodingQuality;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_FILE_NAME: &str = "config.json";

/// Encoding used for captured photos
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoOutputFormat {
    /// Lossless
    #[default]
    Png,
    Jpeg,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera backend to use (V4L2 or virtual)
    pub backend: CameraBackendType,
    /// Camera preference used by the first start
    pub default_facing: Facing,
    pub photo_format: PhotoOutputFormat,
    /// Only used when `photo_format` is JPEG
    pub jpeg_quality: EncodingQuality,
    /// Mirror the front camera horizontally (selfie mode)
    pub mirror_preview: bool,
    pub preview_width: u32,
    pub preview_height: u32,
    /// Overrides the key-value storage directory
    pub storage_dir: Option<PathBuf>,
    /// Still image streamed by the virtual backend instead of test patterns
    pub virtual_camera_source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            default_facing: Facing::default(),
            photo_format: PhotoOutputFormat::default(),
            jpeg_quality: EncodingQuality::High,
            mirror_preview: true, // Default to mirrored (selfie mode)
            preview_width: preview::DEFAULT_WIDTH,
            preview_height: preview::DEFAULT_HEIGHT,
            storage_dir: None,
            virtual_camera_source: None,
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the configuration from its default location
    ///
    /// A missing or unreadable file yields the defaults; problems are logged.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            warn!("No configuration directory, using defaults");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring invalid configuration");
                Self::default()
            }
        }
    }

    /// Read a configuration file, returning `None` when it does not exist
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Write the configuration to its default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(io_err)
    }

    /// Directory holding the persisted key-value slots
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join("storage")))
    }

    /// Directory that `export` writes image files to by default
    pub fn export_dir() -> PathBuf {
        dirs::picture_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    /// File the terminal UI logs to while it owns the screen
    pub fn log_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join("mini-gallery.log"))
    }
}
