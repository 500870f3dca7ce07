//! Alphanumeric mode (0010): 0-9, A-Z, space and $%*+-./:

use super::BitReader;

const ALPHANUMERIC_TABLE: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Alphanumeric segment decoder
pub struct AlphanumericDecoder;

impl AlphanumericDecoder {
    /// Read `count` characters: pairs in 11 bits, a trailing single in 6
    pub fn decode(reader: &mut BitReader<'_>, count: usize) -> Option<Vec<u8>> {
        let mut text = Vec::with_capacity(count);
        let mut remaining = count;
        while remaining >= 2 {
            let value = reader.read_bits(11)? as usize;
            if value >= 45 * 45 {
                return None;
            }
            text.push(ALPHANUMERIC_TABLE[value / 45]);
            text.push(ALPHANUMERIC_TABLE[value % 45]);
            remaining -= 2;
        }
        if remaining == 1 {
            let value = reader.read_bits(6)? as usize;
            text.push(*ALPHANUMERIC_TABLE.get(value)?);
        }
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_and_single() {
        // "AC-3": (10*45+12)=462 -> 00111001110, (41*45+3)=1848 -> 11100111000
        let bytes = [0b0011_1001, 0b1101_1100, 0b1110_0000];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(
            AlphanumericDecoder::decode(&mut reader, 4).as_deref(),
            Some(&b"AC-3"[..])
        );

        // single "Z" = 35 -> 100011
        let bytes = [0b1000_1100];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(
            AlphanumericDecoder::decode(&mut reader, 1).as_deref(),
            Some(&b"Z"[..])
        );
    }

    #[test]
    fn test_rejects_values_outside_table() {
        // 2047 > 45*45 - 1
        let bytes = [0xFF, 0xE0];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(AlphanumericDecoder::decode(&mut reader, 2), None);

        // single 63 > 44
        let bytes = [0xFC];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(AlphanumericDecoder::decode(&mut reader, 1), None);
    }
}
