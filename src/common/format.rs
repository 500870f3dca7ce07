/// Format information: error correction level and mask pattern
use crate::common::bch::{bch_encode, nearest_codeword};
use crate::models::{BitMatrix, ECLevel, MaskPattern};

const FORMAT_GENERATOR: u32 = 0x537;
const FORMAT_XOR_MASK: u32 = 0x5412;
const MAX_FORMAT_DISTANCE: u32 = 3;

/// Format info is 15 bits (5 data + 10 ECC), stored twice in every symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Error correction level
    pub ec_level: ECLevel,
    /// Data mask
    pub mask_pattern: MaskPattern,
}

impl FormatInfo {
    /// Format info for a level and mask
    pub fn new(ec_level: ECLevel, mask_pattern: MaskPattern) -> Self {
        Self {
            ec_level,
            mask_pattern,
        }
    }

    /// Masked 15-bit codeword
    pub fn bits(&self) -> u16 {
        let data = ((self.ec_level.format_bits() as u32) << 3) | self.mask_pattern.index() as u32;
        (bch_encode(data, FORMAT_GENERATOR, 10) ^ FORMAT_XOR_MASK) as u16
    }

    /// Closest format to a raw 15-bit read, with its Hamming distance
    pub fn decode(raw: u16) -> Option<(Self, u32)> {
        let candidates = (0u8..32).map(|data| {
            let info = Self::new(
                ECLevel::from_bits(data >> 3),
                MaskPattern::from_bits(data & 0x07),
            );
            (info, info.bits() as u32)
        });
        nearest_codeword(raw as u32 & 0x7FFF, candidates, MAX_FORMAT_DISTANCE)
    }

    /// Draw both copies and the dark module
    pub fn write(&self, matrix: &mut BitMatrix) {
        let size = matrix.width();
        let bits = self.bits();
        for (i, (primary, secondary)) in copy_positions(size).into_iter().enumerate() {
            let bit = (bits >> i) & 1 == 1;
            matrix.set(primary.0, primary.1, bit);
            matrix.set(secondary.0, secondary.1, bit);
        }
        matrix.set(8, size - 8, true);
    }

    /// Read both copies and keep the one closer to a valid codeword
    pub fn read(matrix: &BitMatrix) -> Option<Self> {
        let size = matrix.width();
        if size < 21 {
            return None;
        }
        let mut primary = 0u16;
        let mut secondary = 0u16;
        for (i, (a, b)) in copy_positions(size).into_iter().enumerate() {
            primary |= (matrix.get(a.0, a.1) as u16) << i;
            secondary |= (matrix.get(b.0, b.1) as u16) << i;
        }

        let first = Self::decode(primary);
        let second = Self::decode(secondary);
        match (first, second) {
            (Some((a, da)), Some((b, db))) => Some(if db < da { b } else { a }),
            (Some((a, _)), None) => Some(a),
            (None, Some((b, _))) => Some(b),
            (None, None) => None,
        }
    }
}

/// `(x, y)` of bit `i` in the top-left copy and in the split copy
fn copy_positions(size: usize) -> [((usize, usize), (usize, usize)); 15] {
    let mut positions = [((0, 0), (0, 0)); 15];
    for (i, slot) in positions.iter_mut().enumerate() {
        let primary = match i {
            0..=5 => (8, i),
            6 => (8, 7),
            7 => (8, 8),
            8 => (7, 8),
            _ => (14 - i, 8),
        };
        let secondary = if i < 8 {
            (size - 1 - i, 8)
        } else {
            (8, size - 15 + i)
        };
        *slot = (primary, secondary);
    }
    positions
}
