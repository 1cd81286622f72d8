//! Pixel art pipeline.
//!
//! enhance → (flatten alpha) → downscale by block → quantize → upscale by block
//!
//! Every stage reads its input and returns a fresh buffer, so the caller's
//! original can be reprocessed any number of times with new parameters.

use crate::buffer::{detect_transparency, PixelBuffer};
use crate::composite::composite;
use crate::enhance::enhance;
use crate::error::{PixelArtError, Result};
use crate::quantize::quantize;
use crate::settings::ProcessingParameters;

// ============================================================================
// NEAREST-NEIGHBOR RESAMPLING
// ============================================================================

/// Take the top-left sample of every `block × block` cell
pub fn downscale_blocks(buffer: &PixelBuffer, block: u32) -> Result<PixelBuffer> {
    let (width, height) = buffer.dimensions();
    let block = block.max(1);
    let out_width = width / block;
    let out_height = height / block;

    if out_width == 0 || out_height == 0 {
        return Err(PixelArtError::DegenerateOutput {
            width,
            height,
            pixel_size: block,
        });
    }

    let mut samples = Vec::with_capacity(out_width as usize * out_height as usize * buffer.channels());
    for out_y in 0..out_height {
        for out_x in 0..out_width {
            samples.extend_from_slice(buffer.pixel(out_x * block, out_y * block));
        }
    }

    PixelBuffer::new(out_width, out_height, buffer.layout(), samples)
}

/// Replicate each pixel into a `block × block` cell covering `width × height`.
///
/// Columns and rows past the last whole block repeat the last block, so edge
/// remainders stay one color with their neighbor.
pub fn upscale_blocks(buffer: &PixelBuffer, block: u32, width: u32, height: u32) -> Result<PixelBuffer> {
    let (small_width, small_height) = buffer.dimensions();
    let block = block.max(1);

    let mut samples = Vec::with_capacity(width as usize * height as usize * buffer.channels());
    for y in 0..height {
        let src_y = (y / block).min(small_height - 1);
        for x in 0..width {
            let src_x = (x / block).min(small_width - 1);
            samples.extend_from_slice(buffer.pixel(src_x, src_y));
        }
    }

    PixelBuffer::new(width, height, buffer.layout(), samples)
}

// ============================================================================
// PREVIEW
// ============================================================================

/// Shrink to fit inside `max_width × max_height`, keeping aspect ratio.
///
/// Never enlarges and never produces a zero dimension.
pub fn fit_within(buffer: &PixelBuffer, max_width: u32, max_height: u32) -> Result<PixelBuffer> {
    if max_width == 0 || max_height == 0 {
        return Err(PixelArtError::InvalidInput(format!(
            "preview bounds must be positive, got {}x{}",
            max_width, max_height
        )));
    }

    let (width, height) = buffer.dimensions();
    if width <= max_width && height <= max_height {
        return Ok(buffer.clone());
    }

    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_width);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_height);

    let mut samples = Vec::with_capacity(new_width as usize * new_height as usize * buffer.channels());
    for y in 0..new_height {
        let src_y = (y as u64 * height as u64 / new_height as u64) as u32;
        for x in 0..new_width {
            let src_x = (x as u64 * width as u64 / new_width as u64) as u32;
            samples.extend_from_slice(buffer.pixel(src_x, src_y));
        }
    }

    PixelBuffer::new(new_width, new_height, buffer.layout(), samples)
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// Turn `original` into pixel art according to `params`.
///
/// Fails with `InvalidInput` for out-of-range parameters and with
/// `DegenerateOutput` when a block is larger than either image dimension.
pub fn apply_pixelation(original: &PixelBuffer, params: &ProcessingParameters) -> Result<PixelBuffer> {
    params.validate()?;

    let (width, height) = original.dimensions();
    let pixel_size = params.pixel_size;
    if width / pixel_size == 0 || height / pixel_size == 0 {
        return Err(PixelArtError::DegenerateOutput {
            width,
            height,
            pixel_size,
        });
    }

    // Step 1: Contrast and saturation on a working copy
    let mut working = enhance(original, params.contrast, params.saturation)?;

    // Step 2: Flatten transparency if it is not being kept
    if !params.preserve_transparency && detect_transparency(&working) {
        log::debug!("flattening alpha onto {:?}", params.background_color);
        working = composite(&working, params.background_color)?;
    }

    // Step 3: Downscale with nearest-neighbor sampling
    let small = downscale_blocks(&working, pixel_size)?;
    log::debug!(
        "downscaled {}x{} to {}x{} (block {})",
        width,
        height,
        small.width(),
        small.height(),
        pixel_size
    );

    // Step 4: Palette reduction
    let small = quantize(&small, params.num_colors)?;

    // Step 5: Blow back up into uniform blocks
    upscale_blocks(&small, pixel_size, width, height)
}

/// Same as [`apply_pixelation`].
pub fn pixelate(original: &PixelBuffer, params: &ProcessingParameters) -> Result<PixelBuffer> {
    apply_pixelation(original, params)
}

// ============================================================================
// TESTS
// ============================================================================
