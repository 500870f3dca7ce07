use crate::models::BitMatrix;

/// Sampled grids with more wrong finder modules than this are not symbols
const MAX_FINDER_MISMATCH: f64 = 0.20;
/// Same for the two timing lines
const MAX_TIMING_MISMATCH: f64 = 0.25;

/// Whether a sampled grid has the fixed patterns of a symbol: three finders
/// in the expected corners and alternating timing lines between them.
pub(super) fn looks_like_symbol(modules: &BitMatrix) -> bool {
    let dim = modules.width();
    if dim < 21 || modules.height() != dim {
        return false;
    }
    let (finder_wrong, finder_total) = finder_mismatches(modules);
    let (timing_wrong, timing_total) = timing_mismatches(modules);
    (finder_wrong as f64) <= MAX_FINDER_MISMATCH * finder_total as f64
        && (timing_wrong as f64) <= MAX_TIMING_MISMATCH * timing_total as f64
}

fn finder_mismatches(modules: &BitMatrix) -> (usize, usize) {
    let dim = modules.width();
    let mut wrong = 0;
    for (ox, oy) in [(0, 0), (dim - 7, 0), (0, dim - 7)] {
        for dy in 0..7 {
            for dx in 0..7 {
                let ring = (dx as isize - 3).abs().max((dy as isize - 3).abs());
                if modules.get(ox + dx, oy + dy) != (ring != 2) {
                    wrong += 1;
                }
            }
        }
    }
    (wrong, 3 * 49)
}

fn timing_mismatches(modules: &BitMatrix) -> (usize, usize) {
    let dim = modules.width();
    let mut wrong = 0;
    for i in 8..dim - 8 {
        let expected = i % 2 == 0;
        if modules.get(i, 6) != expected {
            wrong += 1;
        }
        if modules.get(6, i) != expected {
            wrong += 1;
        }
    }
    (wrong, 2 * (dim - 16))
}
