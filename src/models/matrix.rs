/// Packed bit grid used for symbol modules, binarized images and function masks.
///
/// `true` is a dark module / black pixel. Reads outside the grid return `false`
/// and writes outside the grid are ignored, so callers sampling near image
/// borders never need their own bounds checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BitMatrix {
    /// Create an all-light matrix with the given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        let bytes_needed = (width * height).div_ceil(8);
        Self {
            width,
            height,
            data: vec![0; bytes_needed],
        }
    }

    /// Create an all-light square matrix
    pub fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    /// Matrix width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Matrix height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bit at (x, y)
    pub fn get(&self, x: usize, y: usize) -> bool {
        match self.locate(x, y) {
            Some((byte, bit)) => (self.data[byte] >> bit) & 1 == 1,
            None => false,
        }
    }

    /// Bit at signed coordinates; anything outside the grid reads as light
    pub fn get_signed(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        self.get(x as usize, y as usize)
    }

    /// Set bit at (x, y)
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if let Some((byte, bit)) = self.locate(x, y) {
            if value {
                self.data[byte] |= 1 << bit;
            } else {
                self.data[byte] &= !(1 << bit);
            }
        }
    }

    /// Flip bit at (x, y)
    pub fn toggle(&mut self, x: usize, y: usize) {
        if let Some((byte, bit)) = self.locate(x, y) {
            self.data[byte] ^= 1 << bit;
        }
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Packed storage, row-major, least significant bit first
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn locate(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y * self.width + x;
        Some((index / 8, index % 8))
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_matrix() {
        let mut matrix = BitMatrix::new(8, 8);
        assert_eq!(matrix.width(), 8);
        assert_eq!(matrix.height(), 8);

        matrix.set(3, 4, true);
        assert!(matrix.get(3, 4));
        assert!(!matrix.get(3, 3));
        assert_eq!(matrix.count_ones(), 1);

        matrix.toggle(3, 4);
        assert!(!matrix.get(3, 4));
        assert_eq!(matrix.count_ones(), 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut matrix = BitMatrix::square(8);
        matrix.set(10, 10, true);
        matrix.toggle(8, 0);
        assert!(!matrix.get(10, 10));
        assert!(!matrix.get_signed(-1, 3));
        assert_eq!(matrix.count_ones(), 0);
    }

    #[test]
    fn test_equality_tracks_content() {
        let mut a = BitMatrix::square(21);
        let mut b = BitMatrix::square(21);
        assert_eq!(a, b);
        a.set(20, 20, true);
        assert_ne!(a, b);
        b.set(20, 20, true);
        assert_eq!(a, b);
    }
}
