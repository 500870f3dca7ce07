//! QR code decoding after detection
//!
//! - Version candidates and sampling through a homography
//! - Finder and timing structure checks
//! - Format information, unmasking and block de-interleaving
//! - Reed-Solomon correction and segment parsing (numeric, alphanumeric, byte, kanji)

/// Data mode decoders (numeric, alphanumeric) and the bit reader
pub mod modes;
/// Main QR decoder that turns a finder triple into a payload
pub mod qr_decoder;

pub use qr_decoder::{ModuleRead, QrDecoder, SymbolRead};
