use crate::buffer::{Layout, PixelBuffer};
use crate::error::Result;

/// `alpha/255 * color + (1 - alpha/255) * background`, rounded to nearest
fn over(color: u8, alpha: u8, background: u8) -> u8 {
    let a = alpha as u32;
    ((color as u32 * a + background as u32 * (255 - a) + 127) / 255) as u8
}

/// Flatten an RGBA buffer onto an opaque background color.
///
/// The output is always RGB. RGB input has nothing to flatten and is copied.
pub fn composite(buffer: &PixelBuffer, background: (u8, u8, u8)) -> Result<PixelBuffer> {
    if !buffer.has_alpha() {
        return Ok(buffer.clone());
    }

    let bg = [background.0, background.1, background.2];
    let samples: Vec<u8> = buffer
        .pixels()
        .flat_map(|p| {
            let a = p[3];
            [over(p[0], a, bg[0]), over(p[1], a, bg[1]), over(p[2], a, bg[2])]
        })
        .collect();

    PixelBuffer::new(buffer.width(), buffer.height(), Layout::Rgb, samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_keeps_colors() {
        let samples = vec![10, 20, 30, 255, 200, 100, 0, 255];
        let buf = PixelBuffer::new(2, 1, Layout::Rgba, samples).unwrap();
        let out = composite(&buf, (255, 0, 255)).unwrap();
        assert_eq!(out.layout(), Layout::Rgb);
        assert_eq!(out.samples(), &[10, 20, 30, 200, 100, 0]);
    }

    #[test]
    fn test_transparent_becomes_background() {
        let buf = PixelBuffer::from_pixel(3, 3, Layout::Rgba, &[1, 2, 3, 0]).unwrap();
        let out = composite(&buf, (40, 50, 60)).unwrap();
        assert!(out.pixels().all(|p| p == [40, 50, 60]));
    }

    #[test]
    fn test_half_alpha_blends() {
        let buf = PixelBuffer::from_pixel(1, 1, Layout::Rgba, &[255, 0, 100, 128]).unwrap();
        let out = composite(&buf, (0, 255, 100)).unwrap();
        // 255*128/255 = 128, 255*127/255 = 127
        assert_eq!(out.pixel(0, 0), &[128, 127, 100]);
    }

    #[test]
    fn test_rgb_input_is_copied() {
        let buf = PixelBuffer::from_pixel(2, 2, Layout::Rgb, &[5, 6, 7]).unwrap();
        assert_eq!(composite(&buf, (0, 0, 0)).unwrap(), buf);
    }
}
