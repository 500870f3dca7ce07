use image::GrayImage;

use crate::common::format::FormatInfo;
use crate::config;
use crate::models::{BitMatrix, ECLevel, MaskPattern, Point, SymbolMatrix, Version};
use crate::utils::binarization::otsu_threshold;
use crate::utils::geometry::PerspectiveTransform;

/// Cells on each side of the local contrast window
const LOCAL_RADIUS: usize = 2;
/// Minimum spread of cell means for the local midrange to override Otsu
const LOCAL_CONTRAST: u8 = 64;

/// Read a module grid from `gray`.
///
/// `corners` are the outer symbol corners in image coordinates, in the order
/// top-left, top-right, bottom-right, bottom-left. Each module averages a
/// `k x k` lattice of pixels from the middle half of the cell, with `k` from
/// `QR_SAMPLE_GRID`. See [`sample_grid_with`].
pub fn sample_grid(gray: &GrayImage, corners: &[Point; 4], version: Version) -> Option<SymbolMatrix> {
    sample_grid_with(gray, corners, version, config::sample_grid())
}

/// [`sample_grid`] with an explicit sub-sample count.
///
/// The level and mask of the returned symbol come from its format
/// information; when neither copy is readable they default to M and mask 0.
/// `None` when the corners do not span a quadrilateral.
pub fn sample_grid_with(
    gray: &GrayImage,
    corners: &[Point; 4],
    version: Version,
    k: usize,
) -> Option<SymbolMatrix> {
    let dim = version.size();
    let side = dim as f64;
    let module_space = [
        Point::new(0.0, 0.0),
        Point::new(side, 0.0),
        Point::new(side, side),
        Point::new(0.0, side),
    ];
    let transform = PerspectiveTransform::from_points(&module_space, corners)?;

    let means = cell_means(gray, &transform, dim, k.max(1));
    let modules = threshold_cells(&means, dim);

    let format = FormatInfo::read(&modules)
        .unwrap_or_else(|| FormatInfo::new(ECLevel::default(), MaskPattern::Pattern0));
    Some(SymbolMatrix::new(
        version,
        format.ec_level,
        format.mask_pattern,
        modules,
    ))
}

fn cell_means(gray: &GrayImage, transform: &PerspectiveTransform, dim: usize, k: usize) -> Vec<u8> {
    let (width, height) = (gray.width() as f64, gray.height() as f64);
    let offsets: Vec<f64> = (0..k)
        .map(|i| 0.25 + 0.5 * (i as f64 + 0.5) / k as f64)
        .collect();

    let mut means = Vec::with_capacity(dim * dim);
    for my in 0..dim {
        for mx in 0..dim {
            let mut sum = 0u32;
            for &oy in &offsets {
                for &ox in &offsets {
                    let p = transform.transform(&Point::new(mx as f64 + ox, my as f64 + oy));
                    let inside = p.is_finite() && p.x >= 0.0 && p.y >= 0.0 && p.x < width && p.y < height;
                    sum += if inside {
                        gray.get_pixel(p.x as u32, p.y as u32).0[0] as u32
                    } else {
                        255
                    };
                }
            }
            means.push((sum / (k * k) as u32) as u8);
        }
    }
    means
}

// Otsu over all cells, replaced by the local midrange where the window has contrast
fn threshold_cells(means: &[u8], dim: usize) -> BitMatrix {
    let global = otsu_threshold(means);
    let mut modules = BitMatrix::square(dim);
    for y in 0..dim {
        for x in 0..dim {
            let mut lo = u8::MAX;
            let mut hi = u8::MIN;
            for wy in y.saturating_sub(LOCAL_RADIUS)..(y + LOCAL_RADIUS + 1).min(dim) {
                for wx in x.saturating_sub(LOCAL_RADIUS)..(x + LOCAL_RADIUS + 1).min(dim) {
                    let v = means[wy * dim + wx];
                    lo = lo.min(v);
                    hi = hi.max(v);
                }
            }
            let threshold = if hi - lo >= LOCAL_CONTRAST {
                ((lo as u16 + hi as u16 + 1) / 2) as u8
            } else {
                global
            };
            modules.set(x, y, means[y * dim + x] < threshold);
        }
    }
    modules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::render::render;
    use image::{DynamicImage, Rgb, imageops};

    fn gray_render(payload: &[u8], level: ECLevel) -> (SymbolMatrix, GrayImage) {
        let symbol = encode(payload, level).unwrap();
        let rgb = render(&symbol, 4, 2, Rgb([0, 0, 0]), Rgb([255, 255, 255])).unwrap();
        (symbol, DynamicImage::ImageRgb8(rgb).to_luma8())
    }

    #[test]
    fn test_sample_upright_render() {
        let (symbol, gray) = gray_render(b"sampler", ECLevel::Q);
        let far = 8.0 + 21.0 * 4.0;
        let corners = [
            Point::new(8.0, 8.0),
            Point::new(far, 8.0),
            Point::new(far, far),
            Point::new(8.0, far),
        ];
        let sampled = sample_grid_with(&gray, &corners, symbol.version(), 3).unwrap();
        assert_eq!(sampled, symbol);
    }

    #[test]
    fn test_sample_rotated_render() {
        let (symbol, gray) = gray_render(b"turned a quarter", ECLevel::M);
        let version = symbol.version();
        let near = 8.0;
        let far = 8.0 + version.size() as f64 * 4.0;
        let rotated = imageops::rotate90(&gray);
        let corners = [
            Point::new(far, near),
            Point::new(far, far),
            Point::new(near, far),
            Point::new(near, near),
        ];
        let sampled = sample_grid_with(&rotated, &corners, version, 2).unwrap();
        assert_eq!(sampled.modules(), symbol.modules());
        assert_eq!(sampled.mask(), symbol.mask());
    }

    #[test]
    fn test_degenerate_corners() {
        let gray = GrayImage::new(10, 10);
        let corners = [Point::new(1.0, 1.0); 4];
        assert!(sample_grid_with(&gray, &corners, Version::MIN, 3).is_none());
    }

    #[test]
    fn test_blank_area_samples_light() {
        let gray = GrayImage::from_pixel(50, 50, image::Luma([255]));
        let corners = [
            Point::new(2.0, 2.0),
            Point::new(44.0, 2.0),
            Point::new(44.0, 44.0),
            Point::new(2.0, 44.0),
        ];
        let sampled = sample_grid_with(&gray, &corners, Version::MIN, 3).unwrap();
        assert_eq!(sampled.modules().count_ones(), 0);
        assert_eq!(sampled.ec_level(), ECLevel::M);
    }
}
