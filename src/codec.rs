//! Load and save through the `image` crate.
//!
//! Decoding accepts whatever `image` was built with (PNG, JPEG, BMP, GIF,
//! TIFF at minimum). Encoding picks the format from the file extension:
//! - `.jpg` / `.jpeg` → JPEG at `SaveOptions::jpeg_quality`
//! - `.png` → PNG, best compression with adaptive filtering
//! - `.bmp` → uncompressed BMP
//! - anything else → PNG

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::buffer::{Layout, PixelBuffer};
use crate::composite::composite;
use crate::error::{PixelArtError, Result};
use crate::settings::SaveOptions;

// ============================================================================
// LOAD
// ============================================================================

/// A decoded image together with the container format it came from
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub buffer: PixelBuffer,
    pub format: Option<ImageFormat>,
}

/// Decode an image file into an RGB or RGBA buffer
pub fn load(path: &Path) -> Result<LoadedImage> {
    let fail = |e: &dyn std::fmt::Display| {
        PixelArtError::LoadFailure(format!("Failed to load {}: {}", path.display(), e))
    };

    let reader = ImageReader::open(path)
        .map_err(|e| fail(&e))?
        .with_guessed_format()
        .map_err(|e| fail(&e))?;
    let format = reader
        .format()
        .or_else(|| ImageFormat::from_path(path).ok());

    let img = reader.decode().map_err(|e| fail(&e))?;
    let buffer = PixelBuffer::from_dynamic(&img).map_err(|e| fail(&e))?;

    log::info!(
        "Loaded {} ({}x{}, {:?}, format {:?})",
        path.display(),
        buffer.width(),
        buffer.height(),
        buffer.layout(),
        format
    );

    Ok(LoadedImage { buffer, format })
}

/// Upper-case display name of a container format, e.g. "PNG"
pub fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_uppercase()
}

// ============================================================================
// SAVE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Bmp,
}

impl OutputFormat {
    /// Format for a recognized extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "bmp" => Some(OutputFormat::Bmp),
            _ => None,
        }
    }

    /// Format chosen for `path`, PNG when the extension is missing or unknown
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(OutputFormat::Png)
    }
}

fn color_type(layout: Layout) -> ExtendedColorType {
    match layout {
        Layout::Rgb => ExtendedColorType::Rgb8,
        Layout::Rgba => ExtendedColorType::Rgba8,
    }
}

fn encode<W: Write>(
    writer: &mut W,
    buffer: &PixelBuffer,
    format: OutputFormat,
    options: &SaveOptions,
) -> std::result::Result<(), image::ImageError> {
    let (width, height) = buffer.dimensions();
    let color = color_type(buffer.layout());

    match format {
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(writer, options.jpeg_quality)
            .write_image(buffer.samples(), width, height, color),
        OutputFormat::Png => {
            PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive)
                .write_image(buffer.samples(), width, height, color)
        }
        OutputFormat::Bmp => {
            BmpEncoder::new(writer).write_image(buffer.samples(), width, height, color)
        }
    }
}

/// Write `buffer` to `path`, choosing the format from the extension
pub fn save(buffer: &PixelBuffer, path: &Path, options: &SaveOptions) -> Result<()> {
    options.validate()?;

    let format = match path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_extension)
    {
        Some(format) => format,
        None => {
            log::warn!("No known extension on {}, saving as PNG", path.display());
            OutputFormat::Png
        }
    };

    // JPEG has no alpha channel
    let flattened;
    let buffer = if format == OutputFormat::Jpeg && buffer.has_alpha() {
        log::warn!(
            "Flattening alpha onto {:?} for JPEG output",
            options.background_color
        );
        flattened = composite(buffer, options.background_color)?;
        &flattened
    } else {
        buffer
    };

    let fail = |e: &dyn std::fmt::Display| {
        PixelArtError::SaveFailure(format!("Failed to save {}: {}", path.display(), e))
    };

    // Ensure output directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| fail(&e))?;
        }
    }

    let file = File::create(path).map_err(|e| fail(&e))?;
    let mut writer = BufWriter::new(file);
    encode(&mut writer, buffer, format, options).map_err(|e| fail(&e))?;
    writer.flush().map_err(|e| fail(&e))?;

    log::info!(
        "Saved {}x{} image to {} as {:?}",
        buffer.width(),
        buffer.height(),
        path.display(),
        format
    );
    Ok(())
}

/// Encode as PNG bytes (for preview/transfer without file I/O)
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    encode(&mut bytes, buffer, OutputFormat::Png, &SaveOptions::default())
        .map_err(|e| PixelArtError::SaveFailure(format!("Failed to encode PNG: {}", e)))?;
    Ok(bytes)
}

// ============================================================================
// TESTS
// ============================================================================
