use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{ECLevel, ScanOutcome, Version};

/// Registry record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Fresh random id
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for RecordId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl std::str::FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque handle to a stored raster, issued by an artifact store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap a store-specific handle
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Handle as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One recorded decode attempt against a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// When the scan was recorded
    pub at: DateTime<Utc>,
    /// What the decoder reported
    pub outcome: ScanOutcome,
}

/// A generated symbol persisted by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrRecord {
    /// Record id
    pub id: RecordId,
    /// Encoded payload
    pub payload: Vec<u8>,
    /// Error correction level used for encoding
    pub ec_level: ECLevel,
    /// Version the encoder selected
    pub version: Version,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Stored PNG artifact
    pub image: ImageRef,
    /// Outcome of the most recent recorded scan
    pub last_scan_result: Option<ScanOutcome>,
    /// Every recorded scan, oldest first
    pub scan_history: Vec<ScanEvent>,
}

impl QrRecord {
    /// Payload as text, replacing invalid UTF-8
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// Append a scan and make it the latest result
    pub(crate) fn push_scan(&mut self, event: ScanEvent) {
        self.last_scan_result = Some(event.outcome.clone());
        self.scan_history.push(event);
    }
}
