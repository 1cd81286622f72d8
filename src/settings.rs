use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{PixelArtError, Result};

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParameters {
    /// Block edge length in source pixels (default: 8)
    pub pixel_size: u32,
    /// Target palette size, 1-256 (default: 32)
    pub num_colors: u32,
    /// Contrast factor, 1.0 = unchanged (default: 1.0)
    pub contrast: f32,
    /// Saturation factor, 1.0 = unchanged, 0.0 = grayscale (default: 1.2)
    pub saturation: f32,
    /// Keep the alpha channel instead of flattening onto the background (default: true)
    pub preserve_transparency: bool,
    /// Background used when transparency is flattened away (default: white)
    pub background_color: (u8, u8, u8),
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            // Starting values of the original control surface
            pixel_size: 8,
            num_colors: 32,
            contrast: 1.0,
            saturation: 1.2,
            preserve_transparency: true,
            background_color: (255, 255, 255),
        }
    }
}

pub const MAX_COLORS: u32 = 256;

impl ProcessingParameters {
    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<()> {
        if self.pixel_size < 1 {
            return Err(PixelArtError::InvalidInput(
                "pixel_size must be at least 1".to_string(),
            ));
        }
        if self.num_colors < 1 || self.num_colors > MAX_COLORS {
            return Err(PixelArtError::InvalidInput(format!(
                "num_colors must be between 1 and {}, got {}",
                MAX_COLORS, self.num_colors
            )));
        }
        if !self.contrast.is_finite() || self.contrast <= 0.0 {
            return Err(PixelArtError::InvalidInput(format!(
                "contrast must be a positive number, got {}",
                self.contrast
            )));
        }
        if !self.saturation.is_finite() || self.saturation < 0.0 {
            return Err(PixelArtError::InvalidInput(format!(
                "saturation must be zero or positive, got {}",
                self.saturation
            )));
        }
        Ok(())
    }

    /// Parse parameters from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PixelArtError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }
}

/// Options for writing a processed image to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    /// JPEG quality 1-100 (default: 95)
    pub jpeg_quality: u8,
    /// Background for flattening alpha when the target format has none (default: white)
    pub background_color: (u8, u8, u8),
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: 95,
            background_color: (255, 255, 255),
        }
    }
}

impl SaveOptions {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PixelArtError::InvalidInput(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}
