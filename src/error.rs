//! Error types for the encode, render and registry paths.
//!
//! Decoding never returns an error: see [`crate::models::ScanOutcome`].

use thiserror::Error;

use crate::models::{ECLevel, RecordId, Version};
use crate::registry::ports::StoreError;

/// Errors raised while building a symbol
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Nothing to encode
    #[error("payload is empty")]
    EmptyPayload,
    /// Payload exceeds the largest allowed version at this level
    #[error("payload of {len} bytes exceeds {max} bytes available at level {level} (version {version})")]
    PayloadTooLarge {
        /// Payload length in bytes
        len: usize,
        /// Byte capacity of `version` at `level`
        max: usize,
        /// Requested level
        level: ECLevel,
        /// Largest version allowed
        version: Version,
    },
    /// Payload rejected by the configured character set profile
    #[error("payload is not valid UTF-8 (first invalid byte at offset {offset})")]
    UnsupportedCharacterSet {
        /// Byte offset of the first invalid sequence
        offset: usize,
    },
    /// `min_version` is above `max_version`
    #[error("version range {min}..={max} is empty")]
    InvalidVersionRange {
        /// Configured lower bound
        min: Version,
        /// Configured upper bound
        max: Version,
    },
}

/// Errors raised while rasterizing a symbol
#[derive(Debug, Error)]
pub enum RenderError {
    /// Module size is zero or the image would not fit in `u32` pixels
    #[error("invalid raster dimensions: module size {module_px}px, border {border} modules")]
    InvalidDimensions {
        /// Requested pixels per module
        module_px: u32,
        /// Requested quiet zone in modules
        border: u32,
    },
    /// PNG encoding failed
    #[error("png encoding failed: {0}")]
    Png(#[from] image::ImageError),
}

/// Errors surfaced by the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Payload could not be encoded
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// Symbol could not be rasterized
    #[error(transparent)]
    Render(#[from] RenderError),
    /// A persistence call failed or did not finish within the configured timeout
    #[error("store unavailable during {operation}: {reason}")]
    StoreUnavailable {
        /// Port call that failed, e.g. `put_record`
        operation: &'static str,
        /// Port error or timeout description
        reason: String,
    },
    /// No record with this id
    #[error("unknown record {0}")]
    UnknownRecord(RecordId),
}

impl RegistryError {
    pub(crate) fn store(operation: &'static str, err: StoreError) -> Self {
        Self::StoreUnavailable {
            operation,
            reason: err.to_string(),
        }
    }

    pub(crate) fn timeout(operation: &'static str, limit: std::time::Duration) -> Self {
        Self::StoreUnavailable {
            operation,
            reason: format!("timed out after {} ms", limit.as_millis()),
        }
    }

    /// Whether retrying later could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

/// Errors at the transport-facing boundary
#[derive(Debug, Error)]
pub enum ApiError {
    /// Uploaded bytes are not a readable image
    #[error("unreadable image: {0}")]
    Image(#[from] image::ImageError),
    /// Registry operation failed
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
