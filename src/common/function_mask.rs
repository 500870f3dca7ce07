use crate::models::{BitMatrix, MaskPattern, Version};

/// Function module mask for a specific QR version.
/// true = function module (not data), false = data module.
#[derive(Debug, Clone)]
pub struct FunctionMask {
    mask: BitMatrix,
    version: Version,
}

impl FunctionMask {
    /// Function module layout of `version`
    pub fn new(version: Version) -> Self {
        let size = version.size();
        let mut mask = BitMatrix::square(size);

        // Finders plus separators, clipped at the symbol edge
        Self::mark_finder_area(&mut mask, 0, 0);
        Self::mark_finder_area(&mut mask, size - 7, 0);
        Self::mark_finder_area(&mut mask, 0, size - 7);

        for i in 0..size {
            mask.set(6, i, true);
            mask.set(i, 6, true);
        }

        for (cx, cy) in alignment_centers(version) {
            for dy in 0..5 {
                for dx in 0..5 {
                    mask.set(cx - 2 + dx, cy - 2 + dy, true);
                }
            }
        }

        // Format info areas
        for i in 0..9 {
            mask.set(8, i, true);
            mask.set(i, 8, true);
        }
        for i in 0..8 {
            mask.set(size - 1 - i, 8, true);
            mask.set(8, size - 1 - i, true);
        }

        // Version info: 6x3 above the bottom-left finder, 3x6 left of the top-right
        if version.has_version_info() {
            for a in 0..6 {
                for b in 0..3 {
                    mask.set(size - 11 + b, a, true);
                    mask.set(a, size - 11 + b, true);
                }
            }
        }

        Self { mask, version }
    }

    /// Side length in modules
    pub fn size(&self) -> usize {
        self.mask.width()
    }

    /// Version the layout belongs to
    pub fn version(&self) -> Version {
        self.version
    }

    /// Whether (`x`, `y`) is reserved for a function pattern
    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y)
    }

    /// Modules left for data and remainder bits
    pub fn data_modules_count(&self) -> usize {
        let size = self.size();
        size * size - self.mask.count_ones()
    }

    /// Data module coordinates `(x, y)` in codeword bit order.
    ///
    /// Two-column strips are walked right to left, alternating upward and
    /// downward, skipping the vertical timing column. Bit `i` of the
    /// interleaved codeword stream (MSB first) lands on entry `i`; trailing
    /// entries past the last codeword are remainder bits.
    pub fn data_module_positions(&self) -> Vec<(usize, usize)> {
        let size = self.size();
        let mut positions = Vec::with_capacity(self.data_modules_count());
        let mut right = size as isize - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            let upward = ((right + 1) & 2) == 0;
            for vert in 0..size {
                let y = if upward { size - 1 - vert } else { vert };
                for j in 0..2 {
                    let x = (right - j) as usize;
                    if !self.is_function(x, y) {
                        positions.push((x, y));
                    }
                }
            }
            right -= 2;
        }
        positions
    }

    /// XOR `mask` over every data module; applying it twice restores the input
    pub fn apply_mask(&self, matrix: &mut BitMatrix, mask: MaskPattern) {
        let size = self.size();
        for y in 0..size {
            for x in 0..size {
                if !self.is_function(x, y) && mask.is_masked(y, x) {
                    matrix.toggle(x, y);
                }
            }
        }
    }

    fn mark_finder_area(mask: &mut BitMatrix, x: usize, y: usize) {
        let size = mask.width();
        let start_x = x.saturating_sub(1);
        let start_y = y.saturating_sub(1);
        let end_x = (x + 8).min(size);
        let end_y = (y + 8).min(size);
        for yy in start_y..end_y {
            for xx in start_x..end_x {
                mask.set(xx, yy, true);
            }
        }
    }
}

/// Alignment pattern center coordinates along one axis
pub fn alignment_pattern_positions(version: Version) -> Vec<usize> {
    let v = version.number() as usize;
    if v == 1 {
        return Vec::new();
    }
    let num_align = v / 7 + 2;
    let size = version.size();
    let step = if v == 32 {
        26
    } else {
        (v * 4 + num_align * 2 + 1) / (num_align * 2 - 2) * 2
    };

    let mut positions = vec![6usize; num_align];
    let mut pos = size - 7;
    for slot in positions.iter_mut().skip(1).rev() {
        *slot = pos;
        pos = pos.saturating_sub(step);
    }
    positions
}

/// Alignment pattern centers `(x, y)`, excluding the three finder corners
pub fn alignment_centers(version: Version) -> Vec<(usize, usize)> {
    let positions = alignment_pattern_positions(version);
    let last = positions.len().saturating_sub(1);
    let mut centers = Vec::new();
    for (i, &cx) in positions.iter().enumerate() {
        for (j, &cy) in positions.iter().enumerate() {
            let corner = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
            if !corner {
                centers.push((cx, cy));
            }
        }
    }
    centers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::tables::num_raw_data_modules;

    fn v(n: u8) -> Version {
        Version::new(n).unwrap()
    }

    #[test]
    fn test_alignment_positions() {
        assert!(alignment_pattern_positions(v(1)).is_empty());
        assert_eq!(alignment_pattern_positions(v(2)), vec![6, 18]);
        assert_eq!(alignment_pattern_positions(v(7)), vec![6, 22, 38]);
        assert_eq!(alignment_pattern_positions(v(15)), vec![6, 26, 48, 70]);
        assert_eq!(alignment_pattern_positions(v(32)), vec![6, 34, 60, 86, 112, 138]);
        assert_eq!(
            alignment_pattern_positions(v(40)),
            vec![6, 30, 58, 86, 114, 142, 170]
        );
    }

    #[test]
    fn test_data_module_count_matches_raw_formula() {
        for n in 1..=40 {
            let version = v(n);
            let mask = FunctionMask::new(version);
            assert_eq!(
                mask.data_modules_count(),
                num_raw_data_modules(version),
                "version {n}"
            );
        }
    }

    #[test]
    fn test_zigzag_starts_bottom_right() {
        let mask = FunctionMask::new(v(1));
        let positions = mask.data_module_positions();
        assert_eq!(positions.len(), 208);
        assert_eq!(&positions[..4], &[(20, 20), (19, 20), (20, 19), (19, 19)]);
        assert!(positions.iter().all(|&(x, _)| x != 6));
    }

    #[test]
    fn test_apply_mask_skips_function_modules() {
        let mask = FunctionMask::new(v(1));
        let mut matrix = BitMatrix::square(21);
        mask.apply_mask(&mut matrix, MaskPattern::Pattern0);
        // (0,0) is inside a finder, (10,10) is data with (10+10) % 2 == 0
        assert!(!matrix.get(0, 0));
        assert!(matrix.get(10, 10));
        assert!(!matrix.get(11, 10));

        mask.apply_mask(&mut matrix, MaskPattern::Pattern0);
        assert_eq!(matrix.count_ones(), 0);
    }
}
