//! In-memory pixel storage shared by every pipeline stage.
//!
//! A [`PixelBuffer`] is always dense, 8 bits per sample, and either RGB or
//! RGBA. Palette-indexed and grayscale sources are expanded on load, so the
//! stages only ever see these two layouts.

use image::{DynamicImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::slice::ChunksExact;
use crate::error::{PixelArtError, Result};

// ============================================================================
// LAYOUT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Rgb,
    Rgba,
}

impl Layout {
    pub fn channels(self) -> usize {
        match self {
            Layout::Rgb => 3,
            Layout::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Layout::Rgba)
    }
}

// ============================================================================
// PIXEL BUFFER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    layout: Layout,
    samples: Vec<u8>,
}

/// A buffer split into its color plane and an optional alpha plane.
///
/// Stages that only reason about color (quantization, enhancement) work on
/// `rgb` and hand `alpha` back untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPlanes {
    pub rgb: Vec<[u8; 3]>,
    pub alpha: Option<Vec<u8>>,
}

fn sample_len(width: u32, height: u32, layout: Layout) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(PixelArtError::InvalidInput(format!(
            "zero-area buffer ({}x{})",
            width, height
        )));
    }

    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(layout.channels()))
        .ok_or_else(|| {
            PixelArtError::InvalidInput(format!("buffer of {}x{} is too large", width, height))
        })
}

impl PixelBuffer {
    /// Wrap raw interleaved samples, checking the size invariant
    pub fn new(width: u32, height: u32, layout: Layout, samples: Vec<u8>) -> Result<Self> {
        let expected = sample_len(width, height, layout)?;
        if samples.len() != expected {
            return Err(PixelArtError::InvalidInput(format!(
                "expected {} samples for {}x{} {:?}, got {}",
                expected,
                width,
                height,
                layout,
                samples.len()
            )));
        }

        Ok(Self {
            width,
            height,
            layout,
            samples,
        })
    }

    /// Create a buffer filled with a single pixel value
    pub fn from_pixel(width: u32, height: u32, layout: Layout, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != layout.channels() {
            return Err(PixelArtError::InvalidInput(format!(
                "fill pixel has {} channels, layout {:?} needs {}",
                pixel.len(),
                layout,
                layout.channels()
            )));
        }
        let len = sample_len(width, height, layout)?;
        let samples = pixel.iter().copied().cycle().take(len).collect();
        Self::new(width, height, layout, samples)
    }

    /// Build a buffer from a color plane and an optional alpha plane
    pub fn from_planes(width: u32, height: u32, planes: ColorPlanes) -> Result<Self> {
        let ColorPlanes { rgb, alpha } = planes;

        match alpha {
            None => {
                let samples = rgb.into_iter().flatten().collect();
                Self::new(width, height, Layout::Rgb, samples)
            }
            Some(alpha) => {
                if alpha.len() != rgb.len() {
                    return Err(PixelArtError::InvalidInput(format!(
                        "alpha plane has {} values for {} pixels",
                        alpha.len(),
                        rgb.len()
                    )));
                }
                let samples = rgb
                    .into_iter()
                    .zip(alpha)
                    .flat_map(|([r, g, b], a)| [r, g, b, a])
                    .collect();
                Self::new(width, height, Layout::Rgba, samples)
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn has_alpha(&self) -> bool {
        self.layout.has_alpha()
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Iterate pixels in row-major order, one slice of `channels()` samples each
    pub fn pixels(&self) -> ChunksExact<'_, u8> {
        self.samples.chunks_exact(self.channels())
    }

    /// Samples of the pixel at `(x, y)`. Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        assert!(x < self.width && y < self.height, "pixel ({}, {}) out of bounds", x, y);
        let channels = self.channels();
        let start = (y as usize * self.width as usize + x as usize) * channels;
        &self.samples[start..start + channels]
    }

    /// Split into color and alpha planes
    pub fn split_planes(&self) -> ColorPlanes {
        let rgb = self.pixels().map(|p| [p[0], p[1], p[2]]).collect();
        let alpha = if self.has_alpha() {
            Some(self.pixels().map(|p| p[3]).collect())
        } else {
            None
        };
        ColorPlanes { rgb, alpha }
    }

    // ------------------------------------------------------------------------
    // image crate interop
    // ------------------------------------------------------------------------

    pub fn from_rgb_image(img: RgbImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::new(width, height, Layout::Rgb, img.into_raw())
    }

    pub fn from_rgba_image(img: RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::new(width, height, Layout::Rgba, img.into_raw())
    }

    /// Normalize a decoded image to RGB, or RGBA when it carries transparency
    pub fn from_dynamic(img: &DynamicImage) -> Result<Self> {
        if img.color().has_alpha() {
            let rgba = Self::from_rgba_image(img.to_rgba8())?;
            if detect_transparency(&rgba) {
                return Ok(rgba);
            }
        }
        Self::from_rgb_image(img.to_rgb8())
    }

    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let (width, height) = self.dimensions();
        let samples = self.samples.clone();
        let img = match self.layout {
            Layout::Rgb => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
            Layout::Rgba => {
                RgbaImage::from_raw(width, height, samples).map(DynamicImage::ImageRgba8)
            }
        };
        img.ok_or_else(|| {
            PixelArtError::InvalidInput(format!("buffer of {}x{} lost its samples", width, height))
        })
    }
}

// ============================================================================
// TRANSPARENCY DETECTION
// ============================================================================

/// True when the buffer has an alpha channel with any value below 255.
///
/// Indexed sources with a transparent palette entry arrive here already
/// expanded to RGBA by the decoder, so they are covered by the same check.
pub fn detect_transparency(buffer: &PixelBuffer) -> bool {
    buffer.has_alpha() && buffer.pixels().any(|p| p[3] != 255)
}

// ============================================================================
// TESTS
// ============================================================================
