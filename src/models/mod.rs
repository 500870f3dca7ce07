/// Packed bit grid
pub mod matrix;
/// Decode results and their diagnostics
pub mod outcome;
/// 2D points and vectors
pub mod point;
/// Version, level, mask and decoded symbol types
pub mod qr_code;
/// Registry records and scan events
pub mod record;
/// Encoded symbols
pub mod symbol;

pub use matrix::BitMatrix;
pub use outcome::{CorruptDetail, CorruptStage, NotFoundReason, ScanOutcome};
pub use point::Point;
pub use qr_code::{DecodedSymbol, ECLevel, MaskPattern, Version};
pub use record::{ImageRef, QrRecord, RecordId, ScanEvent};
pub use symbol::SymbolMatrix;
