use crate::decoder::modes::BitReader;
use crate::decoder::modes::alphanumeric::AlphanumericDecoder;
use crate::decoder::modes::numeric::NumericDecoder;
use crate::models::Version;

const MODE_NUMERIC: u32 = 0b0001;
const MODE_ALPHANUMERIC: u32 = 0b0010;
const MODE_STRUCTURED_APPEND: u32 = 0b0011;
const MODE_BYTE: u32 = 0b0100;
const MODE_FNC1_FIRST: u32 = 0b0101;
const MODE_ECI: u32 = 0b0111;
const MODE_KANJI: u32 = 0b1000;
const MODE_FNC1_SECOND: u32 = 0b1001;

/// Concatenated segment contents; `None` when the stream is malformed
pub(super) fn decode_segments(data: &[u8], version: Version) -> Option<Vec<u8>> {
    let mut reader = BitReader::new(data);
    let mut out = Vec::new();

    while reader.remaining() >= 4 {
        let mode = reader.read_bits(4)?;
        match mode {
            0 => break,
            MODE_NUMERIC => {
                let count = reader.read_bits(char_count_bits(mode, version))? as usize;
                out.extend(NumericDecoder::decode(&mut reader, count)?);
            }
            MODE_ALPHANUMERIC => {
                let count = reader.read_bits(char_count_bits(mode, version))? as usize;
                out.extend(AlphanumericDecoder::decode(&mut reader, count)?);
            }
            MODE_BYTE => {
                let count = reader.read_bits(char_count_bits(mode, version))? as usize;
                for _ in 0..count {
                    out.push(reader.read_bits(8)? as u8);
                }
            }
            MODE_KANJI => {
                let count = reader.read_bits(char_count_bits(mode, version))? as usize;
                for _ in 0..count {
                    let value = reader.read_bits(13)?;
                    let mut code = ((value / 0xC0) << 8) | (value % 0xC0);
                    code += if code < 0x1F00 { 0x8140 } else { 0xC140 };
                    out.push((code >> 8) as u8);
                    out.push((code & 0xFF) as u8);
                }
            }
            MODE_ECI => {
                // designator is 1-3 bytes; the payload is passed through as-is
                let first = reader.read_bits(8)? as u8;
                match first.leading_ones() {
                    0 => {}
                    1 => {
                        reader.read_bits(8)?;
                    }
                    2 => {
                        reader.read_bits(16)?;
                    }
                    _ => return None,
                }
            }
            MODE_STRUCTURED_APPEND => {
                // sequence index, total and parity
                reader.read_bits(16)?;
            }
            MODE_FNC1_FIRST => {}
            MODE_FNC1_SECOND => {
                reader.read_bits(8)?;
            }
            _ => return None,
        }
    }

    Some(out)
}

fn char_count_bits(mode: u32, version: Version) -> usize {
    let tier = match version.number() {
        1..=9 => 0,
        10..=26 => 1,
        _ => 2,
    };
    match mode {
        MODE_NUMERIC => [10, 12, 14][tier],
        MODE_ALPHANUMERIC => [9, 11, 13][tier],
        MODE_BYTE => [8, 16, 16][tier],
        MODE_KANJI => [8, 10, 12][tier],
        _ => 0,
    }
}
