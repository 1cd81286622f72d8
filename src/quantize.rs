//! Palette reduction by median cut.
//!
//! The color plane is reduced to at most `num_colors` representatives and
//! every pixel is replaced by its nearest representative. Alpha, when
//! present, is split off first and reattached unchanged, so one code path
//! serves RGB and RGBA buffers alike.
//!
//! Deterministic for a given input: the histogram is sorted before boxes
//! are built and every tie is broken by position.

use std::collections::HashMap;
use crate::buffer::{ColorPlanes, PixelBuffer};
use crate::error::{PixelArtError, Result};
use crate::settings::MAX_COLORS;

// ============================================================================
// COLOR BOXES
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct ColorCount {
    rgb: [u8; 3],
    count: u32,
}

struct ColorBox {
    colors: Vec<ColorCount>,
    min: [u8; 3],
    max: [u8; 3],
}

impl ColorBox {
    fn from_colors(colors: Vec<ColorCount>) -> Self {
        let mut min = [255u8; 3];
        let mut max = [0u8; 3];
        for c in &colors {
            for ch in 0..3 {
                min[ch] = min[ch].min(c.rgb[ch]);
                max[ch] = max[ch].max(c.rgb[ch]);
            }
        }
        Self { colors, min, max }
    }

    /// Channel with the widest value range, ties going to R then G
    fn widest_channel(&self) -> (usize, u8) {
        let mut channel = 0;
        let mut range = self.max[0] - self.min[0];
        for ch in 1..3 {
            let r = self.max[ch] - self.min[ch];
            if r > range {
                range = r;
                channel = ch;
            }
        }
        (channel, range)
    }

    fn can_split(&self) -> bool {
        self.colors.len() > 1
    }

    /// Split at the pixel-weighted median of the widest channel
    fn split(self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        let mut colors = self.colors;
        colors.sort_by_key(|c| (c.rgb[channel], c.rgb));

        let total: u64 = colors.iter().map(|c| c.count as u64).sum();
        let half = (total + 1) / 2;

        let mut cut = colors.len() / 2;
        let mut acc = 0u64;
        for (i, c) in colors.iter().enumerate() {
            acc += c.count as u64;
            if acc >= half {
                cut = i + 1;
                break;
            }
        }
        // both halves keep at least one color
        let cut = cut.clamp(1, colors.len() - 1);

        let upper = colors.split_off(cut);
        (ColorBox::from_colors(colors), ColorBox::from_colors(upper))
    }

    /// Pixel-weighted mean color of the box
    fn representative(&self) -> [u8; 3] {
        let mut sums = [0u64; 3];
        let mut total = 0u64;
        for c in &self.colors {
            let n = c.count as u64;
            for ch in 0..3 {
                sums[ch] += c.rgb[ch] as u64 * n;
            }
            total += n;
        }
        if total == 0 {
            return [0, 0, 0];
        }
        sums.map(|s| ((s + total / 2) / total) as u8)
    }
}

// ============================================================================
// PALETTE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index of the closest entry by squared RGB distance; ties pick the lowest index
    pub fn nearest_index(&self, rgb: [u8; 3]) -> usize {
        let mut best_idx = 0;
        let mut best_dist = u32::MAX;
        for (i, p) in self.colors.iter().enumerate() {
            let dr = rgb[0] as i32 - p[0] as i32;
            let dg = rgb[1] as i32 - p[1] as i32;
            let db = rgb[2] as i32 - p[2] as i32;
            let dist = (dr * dr + dg * dg + db * db) as u32;
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
            }
        }
        best_idx
    }

    pub fn nearest(&self, rgb: [u8; 3]) -> [u8; 3] {
        self.colors[self.nearest_index(rgb)]
    }
}

fn histogram(rgb: &[[u8; 3]]) -> Vec<ColorCount> {
    let mut counts: HashMap<[u8; 3], u32> = HashMap::new();
    for c in rgb {
        *counts.entry(*c).or_insert(0) += 1;
    }

    let mut colors: Vec<ColorCount> = counts
        .into_iter()
        .map(|(rgb, count)| ColorCount { rgb, count })
        .collect();
    // HashMap order is random; sort so box building is reproducible
    colors.sort_by_key(|c| c.rgb);
    colors
}

/// Recursive median cut over the RGB cube, yielding at most `max_colors` entries
pub fn median_cut(rgb: &[[u8; 3]], max_colors: usize) -> Palette {
    let colors = histogram(rgb);
    if colors.is_empty() || max_colors == 0 {
        return Palette { colors: Vec::new() };
    }

    let mut boxes = vec![ColorBox::from_colors(colors)];

    while boxes.len() < max_colors {
        let mut pick: Option<(usize, u8)> = None;
        for (i, b) in boxes.iter().enumerate() {
            if !b.can_split() {
                continue;
            }
            let (_, range) = b.widest_channel();
            if pick.map_or(true, |(_, best)| range > best) {
                pick = Some((i, range));
            }
        }

        let Some((idx, _)) = pick else {
            break;
        };

        let b = boxes.remove(idx);
        let (lower, upper) = b.split();
        boxes.insert(idx, upper);
        boxes.insert(idx, lower);
    }

    Palette {
        colors: boxes.iter().map(ColorBox::representative).collect(),
    }
}

// ============================================================================
// BUFFER OPERATIONS
// ============================================================================

fn check_num_colors(num_colors: u32) -> Result<()> {
    if num_colors < 1 || num_colors > MAX_COLORS {
        return Err(PixelArtError::InvalidInput(format!(
            "num_colors must be between 1 and {}, got {}",
            MAX_COLORS, num_colors
        )));
    }
    Ok(())
}

/// Median-cut palette of the buffer's color plane
pub fn build_palette(buffer: &PixelBuffer, num_colors: u32) -> Result<Palette> {
    check_num_colors(num_colors)?;
    let planes = buffer.split_planes();
    Ok(median_cut(&planes.rgb, num_colors as usize))
}

/// Reduce the buffer to at most `num_colors` distinct RGB colors.
///
/// The channel count is preserved and alpha values are never touched.
pub fn quantize(buffer: &PixelBuffer, num_colors: u32) -> Result<PixelBuffer> {
    check_num_colors(num_colors)?;

    let ColorPlanes { rgb, alpha } = buffer.split_planes();
    let palette = median_cut(&rgb, num_colors as usize);

    let mut mapping: HashMap<[u8; 3], [u8; 3]> = HashMap::new();
    let mapped: Vec<[u8; 3]> = rgb
        .iter()
        .map(|c| *mapping.entry(*c).or_insert_with(|| palette.nearest(*c)))
        .collect();

    log::debug!(
        "quantized {} distinct colors to a palette of {} (limit {})",
        mapping.len(),
        palette.len(),
        num_colors
    );

    PixelBuffer::from_planes(
        buffer.width(),
        buffer.height(),
        ColorPlanes { rgb: mapped, alpha },
    )
}

/// Number of distinct RGB colors, alpha ignored
pub fn count_colors(buffer: &PixelBuffer) -> usize {
    buffer
        .pixels()
        .map(|p| [p[0], p[1], p[2]])
        .collect::<std::collections::HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Layout;

    fn noisy(width: u32, height: u32, layout: Layout) -> PixelBuffer {
        let channels = layout.channels();
        let mut samples = Vec::new();
        for i in 0..(width * height) {
            samples.push((i * 7 % 256) as u8);
            samples.push((i * 13 % 256) as u8);
            samples.push((i * 29 % 256) as u8);
            if channels == 4 {
                samples.push((i * 3 % 256) as u8);
            }
        }
        PixelBuffer::new(width, height, layout, samples).unwrap()
    }

    #[test]
    fn test_palette_bound() {
        let buf = noisy(32, 32, Layout::Rgb);
        assert!(count_colors(&buf) > 64);
        for k in [1, 2, 5, 8, 64] {
            let out = quantize(&buf, k).unwrap();
            assert!(count_colors(&out) <= k as usize, "k = {}", k);
        }
    }

    #[test]
    fn test_deterministic() {
        let buf = noisy(20, 20, Layout::Rgba);
        let a = quantize(&buf, 6).unwrap();
        let b = quantize(&buf, 6).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_alpha_untouched() {
        let buf = noisy(16, 16, Layout::Rgba);
        let out = quantize(&buf, 4).unwrap();
        assert_eq!(out.layout(), Layout::Rgba);
        assert_eq!(out.split_planes().alpha, buf.split_planes().alpha);
    }

    #[test]
    fn test_few_colors_unchanged() {
        let mut samples = Vec::new();
        for color in [[255, 0, 0], [0, 255, 0], [0, 0, 255], [10, 10, 10]] {
            for _ in 0..4 {
                samples.extend_from_slice(&color);
            }
        }
        let buf = PixelBuffer::new(4, 4, Layout::Rgb, samples).unwrap();
        assert_eq!(quantize(&buf, 4).unwrap(), buf);
        assert_eq!(quantize(&buf, 256).unwrap(), buf);
    }

    #[test]
    fn test_single_color_is_weighted_mean() {
        let mut samples = vec![0u8; 3 * 3];
        samples.extend_from_slice(&[200, 100, 40]);
        let buf = PixelBuffer::new(2, 2, Layout::Rgb, samples).unwrap();
        let out = quantize(&buf, 1).unwrap();
        assert!(out.pixels().all(|p| p == [50, 25, 10]));
    }

    #[test]
    fn test_two_clusters_split() {
        let rgb: Vec<[u8; 3]> = vec![
            [0, 0, 0],
            [4, 2, 0],
            [2, 4, 2],
            [250, 250, 250],
            [254, 252, 250],
            [252, 254, 252],
        ];
        let palette = median_cut(&rgb, 2);
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.nearest([1, 1, 1]), palette.colors()[0]);
        assert!(palette.colors()[0].iter().all(|&c| c < 10));
        assert!(palette.colors()[1].iter().all(|&c| c > 245));
    }

    #[test]
    fn test_nearest_tie_picks_first() {
        let palette = Palette {
            colors: vec![[0, 0, 0], [20, 0, 0]],
        };
        assert_eq!(palette.nearest_index([10, 0, 0]), 0);
    }

    #[test]
    fn test_rejects_color_count_out_of_range() {
        let buf = noisy(4, 4, Layout::Rgb);
        assert!(matches!(quantize(&buf, 0), Err(PixelArtError::InvalidInput(_))));
        assert!(matches!(quantize(&buf, 257), Err(PixelArtError::InvalidInput(_))));
        assert!(build_palette(&buf, 3).unwrap().len() <= 3);
    }
}
