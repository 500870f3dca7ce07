//! Result of a single decode call.
//!
//! Decode failures are values, not errors: "no symbol in this photo" is the
//! common case and callers branch on it.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ECLevel;

/// Outcome of decoding one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Exactly one symbol decoded
    Decoded {
        /// Recovered payload
        payload: Vec<u8>,
    },
    /// No symbol could be located
    NotFound {
        /// Which locating stage gave up
        reason: NotFoundReason,
    },
    /// Two or more distinct symbols decoded; the caller must choose
    Ambiguous {
        /// Every distinct decoded payload
        candidates: Vec<Vec<u8>>,
    },
    /// A symbol was located but its content could not be recovered
    Corrupt {
        /// What went wrong for the most promising located symbol
        detail: CorruptDetail,
    },
}

impl ScanOutcome {
    /// Payload when exactly one symbol decoded
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            ScanOutcome::Decoded { payload } => Some(payload),
            _ => None,
        }
    }

    /// Short lowercase label, used in logs and audit events
    pub fn label(&self) -> &'static str {
        match self {
            ScanOutcome::Decoded { .. } => "decoded",
            ScanOutcome::NotFound { .. } => "not_found",
            ScanOutcome::Ambiguous { .. } => "ambiguous",
            ScanOutcome::Corrupt { .. } => "corrupt",
        }
    }
}

/// Why no symbol was located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum NotFoundReason {
    /// The image has no pixels
    EmptyImage,
    /// Fewer than three finder patterns survived the ratio and cross checks
    TooFewFinders {
        /// Finder patterns found
        found: usize,
    },
    /// Finder patterns exist but no three of them form a plausible symbol
    NoConsistentGeometry {
        /// Finder patterns found
        finders: usize,
        /// Triples that passed the size and right-angle checks
        triples: usize,
    },
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::EmptyImage => write!(f, "image is empty"),
            NotFoundReason::TooFewFinders { found } => {
                write!(f, "found {found} finder patterns, need 3")
            }
            NotFoundReason::NoConsistentGeometry { finders, triples } => write!(
                f,
                "{finders} finder patterns formed {triples} triples, none matched a symbol grid"
            ),
        }
    }
}

/// Stage at which a located symbol failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptStage {
    /// Neither format information copy was within correction distance
    FormatInfo,
    /// At least one Reed-Solomon block exceeded its correction capacity
    ErrorCorrection,
    /// Corrected codewords did not form a valid segment sequence
    Payload,
}

/// Diagnostics for a located but unreadable symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptDetail {
    /// Failing stage
    pub stage: CorruptStage,
    /// Symbol version, when known
    pub version: Option<u8>,
    /// Error correction level, when format information was readable
    pub ec_level: Option<ECLevel>,
    /// Blocks whose errors exceeded capacity
    pub failed_blocks: usize,
    /// Total Reed-Solomon blocks in the symbol
    pub total_blocks: usize,
    /// Largest error count seen in a single block (lower bound for failed blocks)
    pub max_block_errors: usize,
    /// Errors each block can correct
    pub correctable_per_block: usize,
}

impl CorruptDetail {
    pub(crate) fn format_unreadable(version: u8) -> Self {
        Self {
            stage: CorruptStage::FormatInfo,
            version: Some(version),
            ec_level: None,
            failed_blocks: 0,
            total_blocks: 0,
            max_block_errors: 0,
            correctable_per_block: 0,
        }
    }

    /// Orders details so the most informative (furthest stage) wins
    pub(crate) fn rank(&self) -> (CorruptStage, usize) {
        (self.stage, usize::MAX - self.failed_blocks)
    }
}

impl fmt::Display for CorruptDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            CorruptStage::FormatInfo => write!(f, "format information unreadable"),
            CorruptStage::ErrorCorrection => write!(
                f,
                "{} of {} blocks uncorrectable (saw at least {} errors, capacity {} per block)",
                self.failed_blocks,
                self.total_blocks,
                self.max_block_errors,
                self.correctable_per_block
            ),
            CorruptStage::Payload => write!(f, "corrected data is not a valid segment stream"),
        }
    }
}
