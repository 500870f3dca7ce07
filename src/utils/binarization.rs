//! Grayscale to bi-level conversion.
//!
//! `true` in the returned matrices means dark.

use image::GrayImage;

use crate::models::BitMatrix;

/// Tiles per side of the averaging window
const NEIGHBORHOOD: usize = 5;

/// Otsu's threshold; values strictly below it belong to the dark class.
/// Returns 128 when the input has fewer than two distinct values.
pub fn otsu_threshold(values: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &v in values {
        histogram[v as usize] += 1;
    }

    let total = values.len() as f64;
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut best_variance = 0.0f64;
    let mut threshold = 128u8;
    let mut dark_count = 0.0f64;
    let mut dark_sum = 0.0f64;

    for t in 1..=255usize {
        dark_count += histogram[t - 1] as f64;
        dark_sum += (t - 1) as f64 * histogram[t - 1] as f64;
        let light_count = total - dark_count;
        if dark_count == 0.0 || light_count == 0.0 {
            continue;
        }
        let dark_mean = dark_sum / dark_count;
        let light_mean = (total_sum - dark_sum) / light_count;
        let variance = dark_count * light_count * (dark_mean - light_mean).powi(2);
        if variance > best_variance {
            best_variance = variance;
            threshold = t as u8;
        }
    }
    threshold
}

/// Single global threshold chosen by Otsu's method
pub fn otsu_binarize(gray: &GrayImage) -> BitMatrix {
    let threshold = otsu_threshold(gray.as_raw());
    threshold_binarize(gray, threshold)
}

/// Fixed global threshold
pub fn threshold_binarize(gray: &GrayImage, threshold: u8) -> BitMatrix {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let mut binary = BitMatrix::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        if pixel.0[0] < threshold {
            binary.set(x as usize, y as usize, true);
        }
    }
    binary
}

/// Tile-based local threshold.
///
/// Each `tile x tile` block gets a black point: its mean when its range
/// exceeds `min_dynamic_range`, otherwise half its minimum, raised to the
/// neighbouring black points when the block is darker than them. A pixel is
/// dark when it does not exceed the mean black point of the 5x5 tiles around
/// its own. Images narrower than five tiles use [`otsu_binarize`].
pub fn hybrid_binarize(gray: &GrayImage, tile: usize, min_dynamic_range: u8) -> BitMatrix {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let tile = tile.max(2);
    if width < tile * NEIGHBORHOOD || height < tile * NEIGHBORHOOD {
        return otsu_binarize(gray);
    }

    let tiles_x = width.div_ceil(tile);
    let tiles_y = height.div_ceil(tile);
    let pixels = gray.as_raw();
    let black_points = black_points(pixels, width, height, tile, tiles_x, tiles_y, min_dynamic_range);

    let mut binary = BitMatrix::new(width, height);
    let half = NEIGHBORHOOD / 2;
    for ty in 0..tiles_y {
        let cy = ty.clamp(half, tiles_y - 1 - half);
        for tx in 0..tiles_x {
            let cx = tx.clamp(half, tiles_x - 1 - half);
            let mut sum = 0u32;
            for ny in cy - half..=cy + half {
                for nx in cx - half..=cx + half {
                    sum += black_points[ny * tiles_x + nx] as u32;
                }
            }
            let threshold = (sum / (NEIGHBORHOOD * NEIGHBORHOOD) as u32) as u8;

            let (x0, y0) = tile_origin(tx, ty, tile, width, height);
            for y in y0..y0 + tile {
                let row = &pixels[y * width..(y + 1) * width];
                for x in x0..x0 + tile {
                    if row[x] <= threshold {
                        binary.set(x, y, true);
                    }
                }
            }
        }
    }
    binary
}

// Last row and column of tiles are shifted inward so every tile is full
fn tile_origin(tx: usize, ty: usize, tile: usize, width: usize, height: usize) -> (usize, usize) {
    ((tx * tile).min(width - tile), (ty * tile).min(height - tile))
}

#[allow(clippy::too_many_arguments)]
fn black_points(
    pixels: &[u8],
    width: usize,
    height: usize,
    tile: usize,
    tiles_x: usize,
    tiles_y: usize,
    min_dynamic_range: u8,
) -> Vec<u8> {
    let mut points = vec![0u8; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let (x0, y0) = tile_origin(tx, ty, tile, width, height);
            let mut sum = 0u32;
            let mut min = u8::MAX;
            let mut max = u8::MIN;
            for y in y0..y0 + tile {
                for &p in &pixels[y * width + x0..y * width + x0 + tile] {
                    sum += p as u32;
                    min = min.min(p);
                    max = max.max(p);
                }
            }

            let mut average = if max - min > min_dynamic_range {
                (sum / (tile * tile) as u32) as u8
            } else {
                let mut flat = min / 2;
                if tx > 0 && ty > 0 {
                    let up = points[(ty - 1) * tiles_x + tx] as u32;
                    let left = points[ty * tiles_x + tx - 1] as u32;
                    let diagonal = points[(ty - 1) * tiles_x + tx - 1] as u32;
                    let neighbors = ((up + 2 * left + diagonal) / 4) as u8;
                    if min < neighbors {
                        flat = neighbors;
                    }
                }
                flat
            };
            // a black point of 255 would mark pure white as dark
            if average == u8::MAX {
                average -= 1;
            }
            points[ty * tiles_x + tx] = average;
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_threshold_binarize() {
        let gray = GrayImage::from_raw(2, 2, vec![100, 150, 200, 50]).unwrap();
        let binary = threshold_binarize(&gray, 128);
        assert!(binary.get(0, 0));
        assert!(!binary.get(1, 0));
        assert!(!binary.get(0, 1));
        assert!(binary.get(1, 1));
    }

    #[test]
    fn test_otsu_separates_two_classes() {
        let mut values = vec![50u8; 50];
        values.extend(vec![200u8; 50]);
        let t = otsu_threshold(&values);
        assert!(t > 50 && t <= 200);

        let gray = GrayImage::from_raw(10, 10, values).unwrap();
        let binary = otsu_binarize(&gray);
        assert!(binary.get(0, 0));
        assert!(!binary.get(0, 7));
    }

    #[test]
    fn test_otsu_flat_input_defaults() {
        assert_eq!(otsu_threshold(&[77; 16]), 128);
        assert_eq!(otsu_threshold(&[]), 128);
    }

    #[test]
    fn test_hybrid_follows_illumination_gradient() {
        // 4px checkerboard, both classes brighten to the right
        let gray = GrayImage::from_fn(64, 64, |x, y| {
            let dark = (x / 4 + y / 4) % 2 == 0;
            Luma([if dark { 20 + x as u8 } else { 130 + x as u8 }])
        });
        let binary = hybrid_binarize(&gray, 8, 24);
        for y in 0..64 {
            for x in 0..64 {
                let dark = (x / 4 + y / 4) % 2 == 0;
                assert_eq!(binary.get(x, y), dark, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_hybrid_blank_page_is_light() {
        let gray = GrayImage::from_pixel(80, 48, Luma([255]));
        let binary = hybrid_binarize(&gray, 8, 24);
        assert_eq!(binary.count_ones(), 0);
    }

    #[test]
    fn test_small_image_uses_otsu() {
        let gray = GrayImage::from_fn(12, 12, |x, _| Luma([if x < 6 { 10 } else { 240 }]));
        let binary = hybrid_binarize(&gray, 8, 24);
        assert!(binary.get(0, 0));
        assert!(!binary.get(11, 11));
    }
}
