use super::*;
use crate::detector::{FinderDetector, select_triples};
use crate::encoder::{EncodeOptions, QrEncoder, encode};
use crate::render::render;
use crate::utils::binarization::otsu_binarize;
use image::{Rgb, imageops};

// Known-good V1-M grid (mask 7, numeric mode) for "4376471154038"
const GOLDEN: [&str; 21] = [
    "#######.....#.#######",
    "#.....#..#....#.....#",
    "#.###.#...##..#.###.#",
    "#.###.#...#...#.###.#",
    "#.###.#..####.#.###.#",
    "#.....#.#.#...#.....#",
    "#######.#.#.#.#######",
    ".........#...........",
    "#..#.##.######.#.....",
    "###.#..##..#.#.#.##..",
    "#..#.####.##..###...#",
    "..#.#..#....#####....",
    "..#...##.#.#.###.##..",
    "........#.#..####.##.",
    "#######...###.#.####.",
    "#.....#.#.....##....#",
    "#.###.#..##.###..#.##",
    "#.###.#.#.#..####..##",
    "#.###.#..###.###.#..#",
    "#.....#..####..##..#.",
    "#######.###..#.###...",
];

fn golden_matrix() -> BitMatrix {
    let mut matrix = BitMatrix::square(21);
    for (y, row) in GOLDEN.iter().enumerate() {
        for (x, c) in row.bytes().enumerate() {
            matrix.set(x, y, c == b'#');
        }
    }
    matrix
}

fn push_bits(bits: &mut Vec<bool>, value: u32, count: usize) {
    for i in (0..count).rev() {
        bits.push(((value >> i) & 1) != 0);
    }
}

fn to_codewords(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &b)| acc | ((b as u8) << (7 - i)))
        })
        .collect()
}

/// Flip one bit in each of the first `count` codewords
fn damage_codewords(modules: &mut BitMatrix, version: Version, count: usize) {
    let positions = FunctionMask::new(version).data_module_positions();
    for i in 0..count {
        let (x, y) = positions[8 * i + 3];
        modules.toggle(x, y);
    }
}

fn v1() -> Version {
    Version::MIN
}

#[test]
fn test_golden_matrix_decode() {
    let read = QrDecoder::decode_modules(&golden_matrix(), v1()).unwrap();
    assert_eq!(read.data, b"4376471154038");
    assert_eq!(read.ec_level, ECLevel::M);
    assert_eq!(read.mask_pattern, MaskPattern::Pattern7);
    assert_eq!(read.corrected_errors, 0);
}

#[test]
fn test_golden_matrix_has_structure() {
    assert!(structure::looks_like_symbol(&golden_matrix()));
}

#[test]
fn test_decode_payload_byte_mode() {
    let mut bits = Vec::new();
    push_bits(&mut bits, 0b0100, 4);
    push_bits(&mut bits, 2, 8);
    push_bits(&mut bits, b'H' as u32, 8);
    push_bits(&mut bits, b'I' as u32, 8);
    push_bits(&mut bits, 0, 4);

    let data = payload::decode_segments(&to_codewords(&bits), v1()).unwrap();
    assert_eq!(data, b"HI");
}

#[test]
fn test_decode_mixed_modes_with_eci() {
    let mut bits = Vec::new();
    // ECI 26 (UTF-8), skipped
    push_bits(&mut bits, 0b0111, 4);
    push_bits(&mut bits, 26, 8);
    // numeric "12"
    push_bits(&mut bits, 0b0001, 4);
    push_bits(&mut bits, 2, 10);
    push_bits(&mut bits, 12, 7);
    // alphanumeric "A"
    push_bits(&mut bits, 0b0010, 4);
    push_bits(&mut bits, 1, 9);
    push_bits(&mut bits, 10, 6);
    // byte "z"
    push_bits(&mut bits, 0b0100, 4);
    push_bits(&mut bits, 1, 8);
    push_bits(&mut bits, b'z' as u32, 8);
    push_bits(&mut bits, 0, 4);

    let data = payload::decode_segments(&to_codewords(&bits), v1()).unwrap();
    assert_eq!(data, b"12Az");
}

#[test]
fn test_count_width_grows_with_version() {
    // version 10 byte mode uses a 16-bit count
    let mut bits = Vec::new();
    push_bits(&mut bits, 0b0100, 4);
    push_bits(&mut bits, 1, 16);
    push_bits(&mut bits, b'Q' as u32, 8);
    push_bits(&mut bits, 0, 4);

    let v10 = Version::new(10).unwrap();
    assert_eq!(
        payload::decode_segments(&to_codewords(&bits), v10).unwrap(),
        b"Q"
    );
}

#[test]
fn test_truncated_or_unknown_segments_fail() {
    let mut bits = Vec::new();
    push_bits(&mut bits, 0b0100, 4);
    push_bits(&mut bits, 5, 8);
    push_bits(&mut bits, b'a' as u32, 8);
    assert!(payload::decode_segments(&to_codewords(&bits), v1()).is_none());

    let mut bits = Vec::new();
    push_bits(&mut bits, 0b1111, 4);
    push_bits(&mut bits, 0, 4);
    assert!(payload::decode_segments(&to_codewords(&bits), v1()).is_none());
}

#[test]
fn test_decode_modules_matches_encoder() {
    for (payload, level, version) in [
        (&b"hello world"[..], ECLevel::L, 1u8),
        (&b"https://example.com/some/longer/path?q=1"[..], ECLevel::Q, 5),
        (&[0u8, 255, 1, 254, 2][..], ECLevel::H, 3),
        (&b"version seven carries a version block"[..], ECLevel::M, 7),
    ] {
        let version = Version::new(version).unwrap();
        let symbol = QrEncoder::new(EncodeOptions::fixed_version(version))
            .encode(payload, level)
            .unwrap();
        let read = QrDecoder::decode_modules(symbol.modules(), version).unwrap();
        assert_eq!(read.data, payload);
        assert_eq!(read.ec_level, level);
        assert_eq!(read.mask_pattern, symbol.mask());
    }
}

#[test]
fn test_corrects_up_to_capacity() {
    // V1-H: one block, 17 EC codewords, corrects 8
    let symbol = encode(b"hello", ECLevel::H).unwrap();
    assert_eq!(symbol.version(), v1());

    let mut damaged = symbol.modules().clone();
    damage_codewords(&mut damaged, v1(), 8);
    let read = QrDecoder::decode_modules(&damaged, v1()).unwrap();
    assert_eq!(read.data, b"hello");
    assert_eq!(read.corrected_errors, 8);
}

#[test]
fn test_reports_uncorrectable_blocks() {
    let symbol = encode(b"hello", ECLevel::H).unwrap();
    let mut damaged = symbol.modules().clone();
    damage_codewords(&mut damaged, v1(), 17);

    let detail = QrDecoder::decode_modules(&damaged, v1()).unwrap_err();
    assert_eq!(detail.stage, CorruptStage::ErrorCorrection);
    assert_eq!(detail.version, Some(1));
    assert_eq!(detail.ec_level, Some(ECLevel::H));
    assert_eq!(detail.failed_blocks, 1);
    assert_eq!(detail.total_blocks, 1);
    assert_eq!(detail.correctable_per_block, 8);
    assert!(detail.max_block_errors > 8);
}

#[test]
fn test_unreadable_format_is_reported() {
    let mut modules = golden_matrix();
    // all-light format bits are five flips from the nearest codeword
    for i in 0..9 {
        modules.set(8, i, false);
        modules.set(i, 8, false);
    }
    for i in 0..8 {
        modules.set(20 - i, 8, false);
        modules.set(8, 20 - i, false);
    }
    let detail = QrDecoder::decode_modules(&modules, v1()).unwrap_err();
    assert_eq!(detail.stage, CorruptStage::FormatInfo);
}

fn decode_image(gray: &GrayImage) -> Vec<SymbolRead> {
    let binary = otsu_binarize(gray);
    let patterns = FinderDetector::detect(&binary);
    select_triples(&binary, &patterns, 8)
        .iter()
        .map(|triple| QrDecoder::decode(gray, &binary, triple, 3))
        .collect()
}

#[test]
fn test_decode_rendered_symbol() {
    let symbol = encode(b"located and decoded", ECLevel::M).unwrap();
    let rgb = render(&symbol, 6, 4, Rgb([0, 0, 0]), Rgb([255, 255, 255])).unwrap();
    let gray = imageops::grayscale(&rgb);

    let reads = decode_image(&gray);
    let decoded = reads.iter().find_map(|read| match read {
        SymbolRead::Decoded(symbol) => Some(symbol),
        _ => None,
    });
    let decoded = decoded.expect("symbol should decode");
    assert_eq!(decoded.data, b"located and decoded");
    assert_eq!(decoded.version, symbol.version());
    // outer top-left corner sits at the quiet zone edge
    assert!((decoded.position[0].x - 24.0).abs() < 2.0);
    assert!((decoded.position[0].y - 24.0).abs() < 2.0);
}

#[test]
fn test_decode_rotated_symbol() {
    let symbol = encode(b"turned on its side", ECLevel::Q).unwrap();
    let rgb = render(&symbol, 5, 4, Rgb([0, 0, 0]), Rgb([255, 255, 255])).unwrap();
    let gray = imageops::rotate90(&imageops::grayscale(&rgb));

    let payloads: Vec<Vec<u8>> = decode_image(&gray)
        .into_iter()
        .filter_map(|read| match read {
            SymbolRead::Decoded(symbol) => Some(symbol.data),
            _ => None,
        })
        .collect();
    assert!(payloads.iter().any(|p| p == b"turned on its side"));
}

#[test]
fn test_blank_region_is_rejected() {
    let gray = GrayImage::from_pixel(120, 120, image::Luma([255]));
    let binary = BitMatrix::new(120, 120);
    let triple_source = [
        crate::detector::FinderPattern::new(20.0, 20.0, 4.0),
        crate::detector::FinderPattern::new(80.0, 20.0, 4.0),
        crate::detector::FinderPattern::new(20.0, 80.0, 4.0),
    ];
    let triples = select_triples(&binary, &triple_source, 4);
    assert_eq!(triples.len(), 1);
    assert!(matches!(
        QrDecoder::decode(&gray, &binary, &triples[0], 3),
        SymbolRead::Rejected
    ));
}
