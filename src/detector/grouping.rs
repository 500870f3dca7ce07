//! Finder triples: which three patterns could be the corners of one symbol.

use std::cmp::Ordering;

use super::finder::FinderPattern;
use crate::models::{BitMatrix, Point};

/// Patterns considered when forming triples, strongest first
const MAX_CANDIDATES: usize = 48;
/// Largest module size ratio inside a triple
const MAX_SIZE_RATIO: f64 = 1.5;
/// Largest |cos| of the angle at the top-left corner
const MAX_CORNER_COS: f64 = 0.3;
/// Largest ratio between the two legs
const MAX_LEG_RATIO: f64 = 1.4;
/// Largest disagreement of the two per-leg dimension estimates, in modules
const MAX_DIMENSION_SPREAD: f64 = 4.0;

/// Three finder centres ordered as a symbol's corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderTriple {
    /// Finder at the symbol's top-left corner
    pub top_left: Point,
    /// Finder clockwise from `top_left`
    pub top_right: Point,
    /// Finder counter-clockwise from `top_left`
    pub bottom_left: Point,
    /// Module size in pixels measured along the symbol axes
    pub module_size: f64,
    /// Side length estimate in modules, snapped to `17 + 4v`
    pub dimension: usize,
    score: f64,
}

impl FinderTriple {
    /// Version number implied by `dimension`
    pub fn estimated_version(&self) -> u8 {
        ((self.dimension - 17) / 4) as u8
    }
}

/// Accepted triples, best first, at most `max_triples`
pub fn select_triples(
    binary: &BitMatrix,
    patterns: &[FinderPattern],
    max_triples: usize,
) -> Vec<FinderTriple> {
    let mut candidates: Vec<&FinderPattern> = patterns.iter().collect();
    candidates.sort_by(|a, b| b.hits.cmp(&a.hits));
    candidates.truncate(MAX_CANDIDATES);

    let mut triples = Vec::new();
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            for k in (j + 1)..candidates.len() {
                if let Some(triple) = order_triple(binary, [candidates[i], candidates[j], candidates[k]]) {
                    triples.push(triple);
                }
            }
        }
    }

    triples.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
    triples.truncate(max_triples);
    triples
}

/// Pick the right-angle corner, orient the other two by the cross product and
/// check the geometry is that of a square symbol.
fn order_triple(binary: &BitMatrix, patterns: [&FinderPattern; 3]) -> Option<FinderTriple> {
    let sizes = patterns.map(|p| p.module_size);
    let min_size = sizes.iter().copied().fold(f64::INFINITY, f64::min);
    let max_size = sizes.iter().copied().fold(0.0, f64::max);
    if min_size <= 0.0 || max_size / min_size > MAX_SIZE_RATIO {
        return None;
    }

    let mut corner = None;
    for i in 0..3 {
        let p = patterns[i].center;
        let v1 = p.to(&patterns[(i + 1) % 3].center);
        let v2 = p.to(&patterns[(i + 2) % 3].center);
        let denom = v1.dot(&v1).sqrt() * v2.dot(&v2).sqrt();
        if denom == 0.0 {
            return None;
        }
        let cos = (v1.dot(&v2) / denom).abs();
        if corner.is_none_or(|(_, best)| cos < best) {
            corner = Some((i, cos));
        }
    }
    let (index, cos) = corner?;
    if cos >= MAX_CORNER_COS {
        return None;
    }

    let tl = patterns[index];
    let a = patterns[(index + 1) % 3];
    let b = patterns[(index + 2) % 3];
    let (tr, bl) = if tl.center.to(&a.center).cross(&tl.center.to(&b.center)) > 0.0 {
        (a, b)
    } else {
        (b, a)
    };

    let leg_h = tl.center.distance(&tr.center);
    let leg_v = tl.center.distance(&bl.center);
    let leg_ratio = leg_h.max(leg_v) / leg_h.min(leg_v);
    if leg_ratio > MAX_LEG_RATIO {
        return None;
    }

    let module_h = leg_module_size(binary, tl, tr);
    let module_v = leg_module_size(binary, tl, bl);
    let dim_h = leg_h / module_h + 7.0;
    let dim_v = leg_v / module_v + 7.0;
    if (dim_h - dim_v).abs() > MAX_DIMENSION_SPREAD {
        return None;
    }
    let raw = (dim_h + dim_v) / 2.0;
    if !raw.is_finite() || raw < 19.0 || raw > 179.0 {
        return None;
    }
    let version = ((raw - 17.0) / 4.0).round().clamp(1.0, 40.0) as usize;

    Some(FinderTriple {
        top_left: tl.center,
        top_right: tr.center,
        bottom_left: bl.center,
        module_size: (module_h + module_v) / 2.0,
        dimension: 17 + 4 * version,
        score: (max_size / min_size) * 2.0 + leg_ratio + cos,
    })
}

/// Module size along the line joining two finders, measured from both ends.
/// Falls back to the cross-check estimate when a run cannot be traced.
fn leg_module_size(binary: &BitMatrix, from: &FinderPattern, to: &FinderPattern) -> f64 {
    let fallback = (from.module_size + to.module_size) / 2.0;
    let there = finder_width_along(binary, from, &to.center);
    let back = finder_width_along(binary, to, &from.center);
    match (there, back) {
        (Some(a), Some(b)) => (a + b) / 14.0,
        (Some(a), None) | (None, Some(a)) => a / 7.0,
        (None, None) => fallback,
    }
}

/// Width of `finder` along the direction of `toward`: the distance from its
/// centre to the outer edge of the dark ring, once each way.
fn finder_width_along(binary: &BitMatrix, finder: &FinderPattern, toward: &Point) -> Option<f64> {
    let v = finder.center.to(toward);
    let len = v.dot(&v).sqrt();
    if len == 0.0 {
        return None;
    }
    let dir = Point::new(v.x / len, v.y / len);
    let limit = finder.module_size * 8.0;
    let forward = ring_edge_distance(binary, finder.center, dir, limit)?;
    let backward = ring_edge_distance(binary, finder.center, Point::new(-dir.x, -dir.y), limit)?;
    Some(forward + backward)
}

// dark core -> light ring -> dark ring -> light
fn ring_edge_distance(binary: &BitMatrix, from: Point, dir: Point, limit: f64) -> Option<f64> {
    let mut state = 0u8;
    let mut t = 0.0;
    while t <= limit {
        let x = (from.x + dir.x * t).floor() as isize;
        let y = (from.y + dir.y * t).floor() as isize;
        let dark = binary.get_signed(x, y);
        state = match (state, dark) {
            (0, false) => 1,
            (1, true) => 2,
            (2, false) => return Some(t),
            (s, _) => s,
        };
        t += 0.5;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(x: f64, y: f64, module: f64) -> FinderPattern {
        FinderPattern {
            center: Point::new(x, y),
            module_size: module,
            hits: 3,
        }
    }

    #[test]
    fn test_orders_any_rotation() {
        let blank = BitMatrix::new(400, 400);
        // upright: TL (50,50), TR (150,50), BL (50,150); module 100/14
        let m = 100.0 / 14.0;
        let upright = [pattern(150.0, 50.0, m), pattern(50.0, 150.0, m), pattern(50.0, 50.0, m)];
        let triple = order_triple(&blank, [&upright[0], &upright[1], &upright[2]]).unwrap();
        assert_eq!(triple.top_left, Point::new(50.0, 50.0));
        assert_eq!(triple.top_right, Point::new(150.0, 50.0));
        assert_eq!(triple.bottom_left, Point::new(50.0, 150.0));
        assert_eq!(triple.dimension, 21);

        // rotated 180 degrees about (100, 100)
        let turned = [pattern(50.0, 150.0, m), pattern(150.0, 150.0, m), pattern(150.0, 50.0, m)];
        let triple = order_triple(&blank, [&turned[0], &turned[1], &turned[2]]).unwrap();
        assert_eq!(triple.top_left, Point::new(150.0, 150.0));
        assert_eq!(triple.top_right, Point::new(50.0, 150.0));
        assert_eq!(triple.bottom_left, Point::new(150.0, 50.0));
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let blank = BitMatrix::new(400, 400);
        let m = 5.0;
        // no right angle
        let flat = [pattern(0.0, 0.0, m), pattern(100.0, 10.0, m), pattern(200.0, 0.0, m)];
        assert!(order_triple(&blank, [&flat[0], &flat[1], &flat[2]]).is_none());
        // legs too unequal
        let long = [pattern(0.0, 0.0, m), pattern(200.0, 0.0, m), pattern(0.0, 100.0, m)];
        assert!(order_triple(&blank, [&long[0], &long[1], &long[2]]).is_none());
        // module sizes disagree
        let sizes = [pattern(0.0, 0.0, 2.0), pattern(100.0, 0.0, 5.0), pattern(0.0, 100.0, 5.0)];
        assert!(order_triple(&blank, [&sizes[0], &sizes[1], &sizes[2]]).is_none());
    }

    #[test]
    fn test_select_caps_and_sorts() {
        let blank = BitMatrix::new(400, 400);
        let m = 100.0 / 14.0;
        let patterns = vec![
            pattern(50.0, 50.0, m),
            pattern(150.0, 50.0, m),
            pattern(50.0, 150.0, m),
            pattern(150.0, 150.0, m),
        ];
        let all = select_triples(&blank, &patterns, 10);
        assert_eq!(all.len(), 4);
        assert_eq!(select_triples(&blank, &patterns, 2).len(), 2);
        assert!(select_triples(&blank, &patterns[..2], 10).is_empty());
    }
}
