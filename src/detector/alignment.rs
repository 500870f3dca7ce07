/// Alignment pattern search around a predicted centre (versions 2 and up)
use crate::models::{BitMatrix, Point};

/// Search radius in modules
const SEARCH_MODULES: f64 = 4.0;
/// Wrong modules tolerated in the 5x5 template
const MAX_MISMATCH: usize = 2;

/// Centre of the alignment pattern closest to `predicted`.
///
/// `ux` and `uy` are the image-space steps of one module along the symbol's
/// x and y axes, so the template follows rotation and shear. All positions
/// tying for the best template score are averaged.
pub fn find_alignment_center(
    binary: &BitMatrix,
    predicted: Point,
    ux: Point,
    uy: Point,
) -> Option<Point> {
    let module = (ux.x.hypot(ux.y) + uy.x.hypot(uy.y)) / 2.0;
    if !predicted.is_finite() || !module.is_finite() || module < 1.0 {
        return None;
    }

    let radius = (module * SEARCH_MODULES).max(4.0);
    let max_x = binary.width() as f64 - 1.0;
    let max_y = binary.height() as f64 - 1.0;
    let x_range = (predicted.x - radius).max(0.0) as usize
        ..=(predicted.x + radius).min(max_x).max(0.0) as usize;
    let y_range = (predicted.y - radius).max(0.0) as usize
        ..=(predicted.y + radius).min(max_y).max(0.0) as usize;

    let mut best = usize::MAX;
    let mut sum = Point::default();
    let mut count = 0usize;
    for y in y_range {
        for x in x_range.clone() {
            let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let mismatch = template_mismatch(binary, &center, &ux, &uy);
            if mismatch < best {
                best = mismatch;
                sum = center;
                count = 1;
            } else if mismatch == best {
                sum = Point::new(sum.x + center.x, sum.y + center.y);
                count += 1;
            }
        }
    }

    (best <= MAX_MISMATCH && count > 0)
        .then(|| Point::new(sum.x / count as f64, sum.y / count as f64))
}

/// Modules of the 5x5 pattern (dark ring, light ring, dark centre) that disagree
fn template_mismatch(binary: &BitMatrix, center: &Point, ux: &Point, uy: &Point) -> usize {
    let mut mismatches = 0;
    for dy in -2i32..=2 {
        for dx in -2i32..=2 {
            let expected = dx.abs().max(dy.abs()) != 1;
            let sx = center.x + ux.x * dx as f64 + uy.x * dy as f64;
            let sy = center.y + ux.y * dx as f64 + uy.y * dy as f64;
            if binary.get_signed(sx.floor() as isize, sy.floor() as isize) != expected {
                mismatches += 1;
            }
        }
    }
    mismatches
}
