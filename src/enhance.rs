//! Contrast and saturation adjustment.
//!
//! Both adjustments blend each color sample against a gray reference and
//! leave alpha alone:
//! - contrast blends against the mean luma of the whole buffer
//! - saturation blends against the luma of the pixel itself
//!
//! Luma uses the BT.601 weights (0.299, 0.587, 0.114) everywhere.

use crate::buffer::PixelBuffer;
use crate::error::{PixelArtError, Result};

const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// BT.601 luma of an 8-bit RGB triple, in 0.0..=255.0
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    r as f32 * LUMA_R + g as f32 * LUMA_G + b as f32 * LUMA_B
}

/// Mean luma over every pixel, rounded to the nearest integer level
pub fn mean_luma(buffer: &PixelBuffer) -> f32 {
    let total: f64 = buffer
        .pixels()
        .map(|p| luma(p[0], p[1], p[2]) as f64)
        .sum();
    (total / buffer.pixel_count() as f64).round() as f32
}

fn blend(reference: f32, value: u8, factor: f32) -> u8 {
    (reference + (value as f32 - reference) * factor)
        .round()
        .clamp(0.0, 255.0) as u8
}

fn check_factors(contrast: f32, saturation: f32) -> Result<()> {
    if !contrast.is_finite() || contrast <= 0.0 {
        return Err(PixelArtError::InvalidInput(format!(
            "contrast must be a positive number, got {}",
            contrast
        )));
    }
    if !saturation.is_finite() || saturation < 0.0 {
        return Err(PixelArtError::InvalidInput(format!(
            "saturation must be zero or positive, got {}",
            saturation
        )));
    }
    Ok(())
}

fn apply_contrast(samples: &mut [u8], channels: usize, mean: f32, contrast: f32) {
    for px in samples.chunks_exact_mut(channels) {
        for c in &mut px[..3] {
            *c = blend(mean, *c, contrast);
        }
    }
}

fn apply_saturation(samples: &mut [u8], channels: usize, saturation: f32) {
    for px in samples.chunks_exact_mut(channels) {
        let gray = luma(px[0], px[1], px[2]);
        for c in &mut px[..3] {
            *c = blend(gray, *c, saturation);
        }
    }
}

/// Apply contrast then saturation, producing a new buffer.
///
/// A factor of exactly 1.0 skips that adjustment, so `enhance(buf, 1.0, 1.0)`
/// is a bit-exact copy.
pub fn enhance(buffer: &PixelBuffer, contrast: f32, saturation: f32) -> Result<PixelBuffer> {
    // Zero-area buffers are already rejected by PixelBuffer::new
    check_factors(contrast, saturation)?;

    if contrast == 1.0 && saturation == 1.0 {
        return Ok(buffer.clone());
    }

    let channels = buffer.channels();
    let mut samples = buffer.samples().to_vec();

    if contrast != 1.0 {
        let mean = mean_luma(buffer);
        log::debug!("contrast {} around mean luma {}", contrast, mean);
        apply_contrast(&mut samples, channels, mean, contrast);
    }

    if saturation != 1.0 {
        log::debug!("saturation {}", saturation);
        apply_saturation(&mut samples, channels, saturation);
    }

    PixelBuffer::new(buffer.width(), buffer.height(), buffer.layout(), samples)
}

pub fn adjust_contrast(buffer: &PixelBuffer, contrast: f32) -> Result<PixelBuffer> {
    enhance(buffer, contrast, 1.0)
}

pub fn adjust_saturation(buffer: &PixelBuffer, saturation: f32) -> Result<PixelBuffer> {
    enhance(buffer, 1.0, saturation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Layout;

    fn gradient(layout: Layout) -> PixelBuffer {
        let channels = layout.channels();
        let mut samples = Vec::new();
        for i in 0..16u8 {
            samples.extend_from_slice(&[i * 16, 255 - i * 16, ((i as u16 * 37) % 255) as u8]);
            if channels == 4 {
                samples.push(i * 15);
            }
        }
        PixelBuffer::new(4, 4, layout, samples).unwrap()
    }

    #[test]
    fn test_identity_is_bit_exact() {
        for layout in [Layout::Rgb, Layout::Rgba] {
            let buf = gradient(layout);
            assert_eq!(enhance(&buf, 1.0, 1.0).unwrap(), buf);
        }
    }

    #[test]
    fn test_luma_weights() {
        assert!((luma(255, 255, 255) - 255.0).abs() < 0.01);
        assert!((luma(255, 0, 0) - 76.245).abs() < 0.01);
        assert_eq!(luma(0, 0, 0), 0.0);
    }

    #[test]
    fn test_mean_luma_uniform() {
        let buf = PixelBuffer::from_pixel(5, 5, Layout::Rgb, &[100, 100, 100]).unwrap();
        assert_eq!(mean_luma(&buf), 100.0);
    }

    #[test]
    fn test_zero_saturation_is_gray() {
        let out = adjust_saturation(&gradient(Layout::Rgb), 0.0).unwrap();
        for p in out.pixels() {
            assert_eq!(p[0], p[1]);
            assert_eq!(p[1], p[2]);
        }
    }

    #[test]
    fn test_low_contrast_pulls_toward_mean() {
        let mut samples = vec![0u8; 3 * 2];
        samples[3..].copy_from_slice(&[200, 200, 200]);
        let buf = PixelBuffer::new(2, 1, Layout::Rgb, samples).unwrap();
        // mean luma is 100
        let out = adjust_contrast(&buf, 0.5).unwrap();
        assert_eq!(out.pixel(0, 0), &[50, 50, 50]);
        assert_eq!(out.pixel(1, 0), &[150, 150, 150]);
    }

    #[test]
    fn test_high_contrast_clamps() {
        let mut samples = vec![10u8; 3 * 2];
        samples[3..].copy_from_slice(&[250, 250, 250]);
        let buf = PixelBuffer::new(2, 1, Layout::Rgb, samples).unwrap();
        let out = adjust_contrast(&buf, 10.0).unwrap();
        assert_eq!(out.pixel(0, 0), &[0, 0, 0]);
        assert_eq!(out.pixel(1, 0), &[255, 255, 255]);
    }

    #[test]
    fn test_alpha_passes_through() {
        let buf = gradient(Layout::Rgba);
        let out = enhance(&buf, 1.7, 0.3).unwrap();
        let before: Vec<u8> = buf.pixels().map(|p| p[3]).collect();
        let after: Vec<u8> = out.pixels().map(|p| p[3]).collect();
        assert_eq!(before, after);
        assert_eq!(out.layout(), Layout::Rgba);
    }

    #[test]
    fn test_rejects_bad_factors() {
        let buf = gradient(Layout::Rgb);
        assert!(matches!(enhance(&buf, 0.0, 1.0), Err(PixelArtError::InvalidInput(_))));
        assert!(matches!(enhance(&buf, 1.0, -1.0), Err(PixelArtError::InvalidInput(_))));
        assert!(matches!(enhance(&buf, f32::NAN, 1.0), Err(PixelArtError::InvalidInput(_))));
    }
}
