//! Persisted records of generated symbols.
//!
//! [`Registry::store`] encodes, rasterizes and persists in one step: the PNG
//! artifact is saved first and the record put second, and the artifact is
//! removed again when the put fails, so a stored record always points at an
//! existing image. Every port call runs under `store_timeout`; expiry and
//! port failures both surface as [`RegistryError::StoreUnavailable`].
//!
//! Audit events are `info!` events under the `qr_registry::audit` target.

/// Filesystem artifact store
pub mod fs;
/// In-memory record and artifact stores
pub mod memory;
/// Store traits the registry depends on
pub mod ports;

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::codec::{MatrixEncoder, QrCodec};
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::models::{ECLevel, QrRecord, RecordId, ScanEvent, ScanOutcome};
use crate::render::{render_with, to_png};
use ports::{ArtifactStore, RecordStore, StoreError};

pub use fs::FsArtifactStore;
pub use memory::{MemoryArtifactStore, MemoryRecordStore};

pub(crate) const AUDIT: &str = "qr_registry::audit";
const PNG: &str = "image/png";

/// Registry over a record store and an artifact store
pub struct Registry {
    records: Arc<dyn RecordStore>,
    artifacts: Arc<dyn ArtifactStore>,
    encoder: Arc<dyn MatrixEncoder>,
    config: RegistryConfig,
    // per-record locks, present only while held or awaited
    scan_locks: DashMap<RecordId, Arc<Mutex<()>>>,
}

/// Exclusive access to one record; drops its map entry when the last holder leaves
struct RecordGuard<'a> {
    id: RecordId,
    locks: &'a DashMap<RecordId, Arc<Mutex<()>>>,
    lock: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RecordGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // the map and `self.lock` are the only owners left
        self.locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 2);
    }
}

impl Registry {
    /// Registry over the given stores, encoding with [`QrCodec`]
    pub fn new(
        records: Arc<dyn RecordStore>,
        artifacts: Arc<dyn ArtifactStore>,
        config: RegistryConfig,
    ) -> Self {
        Self::with_encoder(records, artifacts, Arc::new(QrCodec::default()), config)
    }

    /// Registry with a custom [`MatrixEncoder`]
    pub fn with_encoder(
        records: Arc<dyn RecordStore>,
        artifacts: Arc<dyn ArtifactStore>,
        encoder: Arc<dyn MatrixEncoder>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            records,
            artifacts,
            encoder,
            config,
            scan_locks: DashMap::new(),
        }
    }

    /// Both stores in memory, default configuration
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryArtifactStore::new()),
            RegistryConfig::default(),
        )
    }

    /// Timeout, render and level settings in use
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Encode `payload`, persist its PNG and a new record
    pub async fn store(&self, payload: &[u8], level: ECLevel) -> Result<QrRecord, RegistryError> {
        let symbol = self.encoder.encode(payload, level)?;
        let png = to_png(&render_with(&symbol, &self.config.render)?)?;

        let image = self.call("save_artifact", self.artifacts.save(png, PNG)).await?;
        let record = QrRecord {
            id: RecordId::random(),
            payload: payload.to_vec(),
            ec_level: level,
            version: symbol.version(),
            created_at: Utc::now(),
            image: image.clone(),
            last_scan_result: None,
            scan_history: Vec::new(),
        };

        if let Err(err) = self
            .call("put_record", self.records.put(&record.id, record.clone()))
            .await
        {
            if let Err(cleanup) = self.call("remove_artifact", self.artifacts.remove(&image)).await {
                warn!(image = %image, error = %cleanup, "orphaned artifact after failed store");
            }
            return Err(err);
        }

        info!(
            target: AUDIT,
            event = "stored",
            id = %record.id,
            version = record.version.number(),
            level = %level,
            bytes = payload.len(),
            "record stored"
        );
        Ok(record)
    }

    /// [`Registry::store`] at the configured default level
    pub async fn store_default(&self, payload: &[u8]) -> Result<QrRecord, RegistryError> {
        self.store(payload, self.config.default_level).await
    }

    /// Record stored under `id`
    pub async fn lookup_by_id(&self, id: &RecordId) -> Result<Option<QrRecord>, RegistryError> {
        self.call("get_record", self.records.get(id)).await
    }

    /// Append a scan to the record and make it the latest result.
    ///
    /// Concurrent scans and evictions of one record through this registry are
    /// applied one at a time; the last scan to finish is `last_scan_result`.
    pub async fn record_scan(
        &self,
        id: &RecordId,
        outcome: ScanOutcome,
    ) -> Result<QrRecord, RegistryError> {
        let _guard = self.lock_record(id).await;

        let mut record = self
            .call("get_record", self.records.get(id))
            .await?
            .ok_or(RegistryError::UnknownRecord(*id))?;
        let label = outcome.label();
        record.push_scan(ScanEvent {
            at: Utc::now(),
            outcome,
        });
        self.call("put_record", self.records.put(id, record.clone()))
            .await?;

        info!(
            target: AUDIT,
            event = "scanned",
            id = %id,
            outcome = label,
            scans = record.scan_history.len(),
            "scan recorded"
        );
        Ok(record)
    }

    /// Scans recorded against `id`, oldest first
    pub async fn scan_history(&self, id: &RecordId) -> Result<Vec<ScanEvent>, RegistryError> {
        self.lookup_by_id(id)
            .await?
            .map(|record| record.scan_history)
            .ok_or(RegistryError::UnknownRecord(*id))
    }

    /// PNG bytes of the record's artifact
    pub async fn load_image(&self, id: &RecordId) -> Result<Vec<u8>, RegistryError> {
        let record = self
            .lookup_by_id(id)
            .await?
            .ok_or(RegistryError::UnknownRecord(*id))?;
        self.call("load_artifact", self.artifacts.load(&record.image))
            .await
    }

    /// Delete the record and its artifact; `false` when no record existed.
    ///
    /// The record goes first. A failure removing the artifact afterwards is
    /// logged and leaves an orphaned blob, not a dangling record.
    pub async fn evict(&self, id: &RecordId) -> Result<bool, RegistryError> {
        let _guard = self.lock_record(id).await;
        let Some(record) = self.lookup_by_id(id).await? else {
            return Ok(false);
        };
        if !self.call("remove_record", self.records.remove(id)).await? {
            return Ok(false);
        }
        if let Err(err) = self
            .call("remove_artifact", self.artifacts.remove(&record.image))
            .await
        {
            warn!(id = %id, image = %record.image, error = %err, "artifact left behind by evict");
        }
        info!(target: AUDIT, event = "evicted", id = %id, "record evicted");
        Ok(true)
    }

    async fn lock_record(&self, id: &RecordId) -> RecordGuard<'_> {
        let lock = self.scan_locks.entry(*id).or_default().clone();
        let mut record = RecordGuard {
            id: *id,
            locks: &self.scan_locks,
            lock,
            guard: None,
        };
        record.guard = Some(record.lock.clone().lock_owned().await);
        record
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, RegistryError> {
        let limit = self.config.store_timeout;
        match tokio::time::timeout(limit, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!(operation, error = %err, "store call failed");
                Err(RegistryError::store(operation, err))
            }
            Err(_) => {
                warn!(operation, timeout_ms = limit.as_millis() as u64, "store call timed out");
                Err(RegistryError::timeout(operation, limit))
            }
        }
    }
}
