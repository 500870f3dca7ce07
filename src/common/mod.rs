//! Symbol structure shared by the encoder and the decoder
//!
//! - Block tables and capacity arithmetic
//! - Function module layout and the zig-zag data path
//! - Reed-Solomon coding over GF(256)
//! - BCH-protected format and version information

/// BCH helpers for format and version codewords
pub mod bch;
/// Format information (EC level + mask)
pub mod format;
/// Function module mask and data module ordering
pub mod function_mask;
/// Reed-Solomon encoder and decoder
pub mod reed_solomon;
/// QR specification tables (ECC codewords/blocks)
pub mod tables;
/// Version information (versions 7-40)
pub mod version;
