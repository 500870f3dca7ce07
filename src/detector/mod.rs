//! Symbol location in a binarized image
//!
//! - Finder pattern detection (the three square markers)
//! - Triple selection and corner ordering
//! - Alignment pattern search for the fourth homography point

/// Alignment pattern search for versions 2+
pub mod alignment;
/// Finder pattern detection using 1:1:3:1:1 ratio scanning
pub mod finder;
/// Grouping finder patterns into oriented triples
pub mod grouping;

pub use finder::{FinderDetector, FinderPattern};
pub use grouping::{FinderTriple, select_triples};
