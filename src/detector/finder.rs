/// Finder pattern detection: 1:1:3:1:1 row scan, cross-checks, clustering
use crate::models::{BitMatrix, Point};

/// Row hits a cluster needs before it is reported
const MIN_HITS: usize = 2;

/// A confirmed finder pattern centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderPattern {
    /// Centre in continuous pixel coordinates
    pub center: Point,
    /// Estimated module size in pixels (along the scan axes)
    pub module_size: f64,
    /// Scan rows that confirmed this pattern
    pub hits: usize,
}

impl FinderPattern {
    /// Single-hit pattern centred at (`x`, `y`)
    pub fn new(x: f64, y: f64, module_size: f64) -> Self {
        Self {
            center: Point::new(x, y),
            module_size,
            hits: 1,
        }
    }

    fn is_near(&self, other: &FinderPattern) -> bool {
        let larger = self.module_size.max(other.module_size);
        let smaller = self.module_size.min(other.module_size);
        self.center.distance(&other.center) <= larger * 1.5 && larger <= smaller * 1.5
    }

    fn absorb(&mut self, other: &FinderPattern) {
        let total = (self.hits + other.hits) as f64;
        let (a, b) = (self.hits as f64 / total, other.hits as f64 / total);
        self.center = Point::new(
            self.center.x * a + other.center.x * b,
            self.center.y * a + other.center.y * b,
        );
        self.module_size = self.module_size * a + other.module_size * b;
        self.hits += other.hits;
    }
}

/// Row-scan finder pattern detector
pub struct FinderDetector;

impl FinderDetector {
    /// Every finder pattern confirmed by at least two scan rows
    pub fn detect(binary: &BitMatrix) -> Vec<FinderPattern> {
        let mut clusters: Vec<FinderPattern> = Vec::new();

        for y in 0..binary.height() {
            let runs = Self::row_runs(binary, y);
            for window in runs.windows(5) {
                if !window[0].dark {
                    continue;
                }
                let counts = [
                    window[0].len,
                    window[1].len,
                    window[2].len,
                    window[3].len,
                    window[4].len,
                ];
                if !ratio_ok(&counts) {
                    continue;
                }
                let center_x = window[2].start as f64 + window[2].len as f64 / 2.0;
                if let Some(found) = Self::confirm(binary, &counts, center_x, y) {
                    match clusters.iter_mut().find(|c| c.is_near(&found)) {
                        Some(cluster) => cluster.absorb(&found),
                        None => clusters.push(found),
                    }
                }
            }
        }

        clusters.retain(|c| c.hits >= MIN_HITS);
        clusters
    }

    fn row_runs(binary: &BitMatrix, y: usize) -> Vec<Run> {
        let width = binary.width();
        let mut runs = Vec::new();
        let mut start = 0;
        for x in 1..=width {
            if x == width || binary.get(x, y) != binary.get(start, y) {
                runs.push(Run {
                    dark: binary.get(start, y),
                    start,
                    len: x - start,
                });
                start = x;
            }
        }
        runs
    }

    /// Vertical then horizontal cross-check through the row hit
    fn confirm(
        binary: &BitMatrix,
        counts: &[usize; 5],
        center_x: f64,
        y: usize,
    ) -> Option<FinderPattern> {
        let total: usize = counts.iter().sum();
        let cx = center_x.floor() as isize;

        let (vertical, cy) = cross_check(binary, cx, y as isize, (0, 1), total)?;
        let v_total: usize = vertical.iter().sum();
        if !ratio_ok(&vertical) || 5 * total.abs_diff(v_total) >= 2 * total {
            return None;
        }

        let (horizontal, cx) = cross_check(binary, cx, cy.floor() as isize, (1, 0), total)?;
        let h_total: usize = horizontal.iter().sum();
        if !ratio_ok(&horizontal) || 5 * total.abs_diff(h_total) >= 2 * total {
            return None;
        }

        let module_size = (h_total + v_total) as f64 / 14.0;
        Some(FinderPattern::new(cx, cy, module_size))
    }
}

#[derive(Debug, Clone, Copy)]
struct Run {
    dark: bool,
    start: usize,
    len: usize,
}

/// 1:1:3:1:1 within half a module per run
fn ratio_ok(counts: &[usize; 5]) -> bool {
    let total: usize = counts.iter().sum();
    if total < 7 || counts.iter().any(|&c| c == 0) {
        return false;
    }
    let unit = total as f64 / 7.0;
    let max_variance = unit / 2.0;
    let off = |count: usize, modules: f64| (count as f64 - unit * modules).abs();
    off(counts[0], 1.0) < max_variance
        && off(counts[1], 1.0) < max_variance
        && off(counts[2], 3.0) < 3.0 * max_variance
        && off(counts[3], 1.0) < max_variance
        && off(counts[4], 1.0) < max_variance
}

/// Run lengths through (`x`, `y`) along `step` in both directions, plus the
/// centre of the middle dark run along that axis. Light runs must end inside
/// the image; the outer dark runs may touch its edge.
fn cross_check(
    binary: &BitMatrix,
    x: isize,
    y: isize,
    step: (isize, isize),
    max_count: usize,
) -> Option<([usize; 5], f64)> {
    let (width, height) = (binary.width() as isize, binary.height() as isize);
    let at = |i: isize| (x + step.0 * i, y + step.1 * i);
    let inside = |i: isize| {
        let (px, py) = at(i);
        px >= 0 && py >= 0 && px < width && py < height
    };
    let dark = |i: isize| {
        let (px, py) = at(i);
        binary.get_signed(px, py)
    };

    if !dark(0) {
        return None;
    }
    let mut counts = [0usize; 5];

    let mut i = 0isize;
    while inside(i) && dark(i) {
        counts[2] += 1;
        i -= 1;
    }
    let behind = counts[2];
    while inside(i) && !dark(i) && counts[1] <= max_count {
        counts[1] += 1;
        i -= 1;
    }
    if !inside(i) || counts[1] > max_count {
        return None;
    }
    while inside(i) && dark(i) && counts[0] <= max_count {
        counts[0] += 1;
        i -= 1;
    }
    if counts[0] > max_count {
        return None;
    }

    let mut j = 1isize;
    while inside(j) && dark(j) {
        counts[2] += 1;
        j += 1;
    }
    let ahead = counts[2] - behind;
    while inside(j) && !dark(j) && counts[3] <= max_count {
        counts[3] += 1;
        j += 1;
    }
    if !inside(j) || counts[3] > max_count {
        return None;
    }
    while inside(j) && dark(j) && counts[4] <= max_count {
        counts[4] += 1;
        j += 1;
    }
    if counts[4] > max_count {
        return None;
    }

    let origin = (if step.0 != 0 { x } else { y }) as f64;
    let center = origin + 1.0 + (ahead as f64 - behind as f64) / 2.0;
    Some((counts, center))
}
