use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Per-call configuration read by processors. Processors never modify it.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    /// Physical pixels per logical point for output bitmaps
    pub scale_factor: f32,
    /// Decode every frame of animated sources up front
    pub preload_all_frames: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            preload_all_frames: false,
        }
    }
}

impl ProcessOptions {
    pub fn new(scale_factor: f32) -> Self {
        Self {
            scale_factor,
            ..Self::default()
        }
    }

    pub fn with_preload_all_frames(mut self, preload_all_frames: bool) -> Self {
        self.preload_all_frames = preload_all_frames;
        self
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.scale_factor.is_finite() && self.scale_factor > 0.0,
            "Scale factor must be a positive number, got {}",
            self.scale_factor
        );
        Ok(())
    }

    pub fn load() -> Option<Self> {
        let config_path = Self::config_path()?;

        match Self::load_from(&config_path) {
            Ok(options) => Some(options),
            Err(e) => {
                log::debug!("No usable options at {}: {e:#}", config_path.display());
                None
            }
        }
    }

    pub fn save(&self) -> Option<()> {
        let config_path = Self::config_path()?;

        self.save_to(&config_path)
            .map_err(|e| log::warn!("Failed to save options: {e:#}"))
            .ok()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let options: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("Saved options to {}", path.display());
        Ok(())
    }

    #[allow(deprecated)]
    fn config_path() -> Option<PathBuf> {
        let home = std::env::home_dir()?;
        Some(home.join(".config").join("imgchain").join("options.json"))
    }
}
