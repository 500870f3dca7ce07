//! Segment decoders for the non-byte data modes
//!
//! - Numeric: digits in groups of three (10 bits)
//! - Alphanumeric: 45-character set in pairs (11 bits)

/// Alphanumeric segments
pub mod alphanumeric;
/// Numeric segments
pub mod numeric;

/// MSB-first reader over corrected data codewords
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Reader positioned at the first bit of `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bits not yet read
    pub fn remaining(&self) -> usize {
        (self.bytes.len() * 8).saturating_sub(self.pos)
    }

    /// Next `n` bits (at most 32) as an integer; `None` past the end
    pub fn read_bits(&mut self, n: usize) -> Option<u32> {
        if n > 32 || n > self.remaining() {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..n {
            let bit = (self.bytes[self.pos / 8] >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | bit as u32;
            self.pos += 1;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_across_byte_boundaries() {
        let bytes = [0b1010_1100, 0b0101_0000];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bits(3), Some(0b101));
        assert_eq!(reader.read_bits(7), Some(0b011_0001));
        assert_eq!(reader.remaining(), 6);
        assert_eq!(reader.read_bits(7), None);
        assert_eq!(reader.read_bits(6), Some(0b01_0000));
        assert_eq!(reader.remaining(), 0);
    }
}
