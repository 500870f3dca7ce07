//! Numeric mode (0001): 3 digits per 10 bits, 2 per 7, 1 per 4

use super::BitReader;

/// Numeric segment decoder
pub struct NumericDecoder;

impl NumericDecoder {
    /// Read `count` digits as ASCII; `None` on truncation or a group value
    /// with more digits than the group holds
    pub fn decode(reader: &mut BitReader<'_>, count: usize) -> Option<Vec<u8>> {
        let mut digits = Vec::with_capacity(count);
        let mut remaining = count;
        while remaining > 0 {
            let group = remaining.min(3);
            let (bits, limit) = match group {
                3 => (10, 1000),
                2 => (7, 100),
                _ => (4, 10),
            };
            let value = reader.read_bits(bits)?;
            if value >= limit {
                return None;
            }
            let text = format!("{value:0width$}", width = group);
            digits.extend_from_slice(text.as_bytes());
            remaining -= group;
        }
        Some(digits)
    }
}
