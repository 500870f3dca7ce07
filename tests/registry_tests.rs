//! Registry integration tests: concurrency, store timeouts and the
//! filesystem artifact store.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use qr_registry::api::{QrService, ScanResponse};
use qr_registry::models::{ImageRef, QrRecord};
use qr_registry::registry::ports::{ArtifactStore, RecordStore, StoreError};
use qr_registry::registry::{FsArtifactStore, MemoryArtifactStore, MemoryRecordStore};
use qr_registry::{
    ECLevel, QrCodec, RecordId, Registry, RegistryConfig, RegistryError, ScanOutcome, decode,
};

fn registry_over(
    records: Arc<dyn RecordStore>,
    artifacts: Arc<dyn ArtifactStore>,
    timeout: Duration,
) -> Registry {
    let config = RegistryConfig {
        store_timeout: timeout,
        ..RegistryConfig::default()
    };
    Registry::new(records, artifacts, config)
}

/// Record store whose writes never finish in time
struct StalledRecords;

#[async_trait]
impl RecordStore for StalledRecords {
    async fn put(&self, _id: &RecordId, _record: QrRecord) -> Result<(), StoreError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }

    async fn get(&self, _id: &RecordId) -> Result<Option<QrRecord>, StoreError> {
        Ok(None)
    }

    async fn remove(&self, _id: &RecordId) -> Result<bool, StoreError> {
        Ok(false)
    }
}

/// Artifact store that is down
struct OfflineArtifacts;

#[async_trait]
impl ArtifactStore for OfflineArtifacts {
    async fn save(&self, _bytes: Vec<u8>, _content_type: &str) -> Result<ImageRef, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn load(&self, image: &ImageRef) -> Result<Vec<u8>, StoreError> {
        Err(StoreError::MissingArtifact(image.clone()))
    }

    async fn remove(&self, _image: &ImageRef) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stores_get_distinct_ids() {
    let records = Arc::new(MemoryRecordStore::new());
    let artifacts = Arc::new(MemoryArtifactStore::new());
    let registry = Arc::new(registry_over(
        records.clone(),
        artifacts.clone(),
        Duration::from_secs(5),
    ));

    let mut handles = Vec::new();
    for i in 0..24 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            let payload = format!("item-{i}");
            registry.store(payload.as_bytes(), ECLevel::M).await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert!(ids.insert(record.id));
    }
    assert_eq!(ids.len(), 24);
    assert_eq!(records.len(), 24);
    assert_eq!(artifacts.len(), 24);

    for id in &ids {
        let record = registry.lookup_by_id(id).await.unwrap().unwrap();
        assert!(record.payload_text().starts_with("item-"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scans_are_all_kept() {
    let registry = Arc::new(Registry::in_memory());
    let record = registry.store(b"popular", ECLevel::L).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let registry = registry.clone();
        let id = record.id;
        handles.push(tokio::spawn(async move {
            registry
                .record_scan(
                    &id,
                    ScanOutcome::Decoded {
                        payload: b"popular".to_vec(),
                    },
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let history = registry.scan_history(&record.id).await.unwrap();
    assert_eq!(history.len(), 16);
    assert!(history.windows(2).all(|pair| pair[0].at <= pair[1].at));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_record_store_times_out() {
    let artifacts = Arc::new(MemoryArtifactStore::new());
    let registry = registry_over(
        Arc::new(StalledRecords),
        artifacts.clone(),
        Duration::from_millis(20),
    );

    let err = registry.store(b"never lands", ECLevel::M).await.unwrap_err();
    assert!(err.is_retryable());
    match err {
        RegistryError::StoreUnavailable { operation, reason } => {
            assert_eq!(operation, "put_record");
            assert!(reason.contains("20 ms"), "{reason}");
        }
        other => panic!("expected StoreUnavailable, got {other:?}"),
    }
    assert!(artifacts.is_empty());
}

#[tokio::test]
async fn test_offline_artifact_store_writes_no_record() {
    let records = Arc::new(MemoryRecordStore::new());
    let registry = registry_over(
        records.clone(),
        Arc::new(OfflineArtifacts),
        Duration::from_secs(1),
    );

    let err = registry.store(b"nowhere", ECLevel::L).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::StoreUnavailable {
            operation: "save_artifact",
            ..
        }
    ));
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_artifacts_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_over(
        Arc::new(MemoryRecordStore::new()),
        Arc::new(FsArtifactStore::new(dir.path())),
        Duration::from_secs(5),
    );

    let record = registry
        .store(b"https://example.com/on-disk", ECLevel::Q)
        .await
        .unwrap();
    let handle = record.image.as_str();
    assert!(handle.starts_with("qr_codes/") && handle.ends_with(".png"), "{handle}");
    let path = dir.path().join(handle);
    assert!(path.is_file());

    let png = registry.load_image(&record.id).await.unwrap();
    assert_eq!(png, std::fs::read(&path).unwrap());
    let image = image::load_from_memory(&png).unwrap();
    assert_eq!(
        decode(&image).payload(),
        Some(&b"https://example.com/on-disk"[..])
    );

    assert!(registry.evict(&record.id).await.unwrap());
    assert!(!path.exists());
    assert!(registry.lookup_by_id(&record.id).await.unwrap().is_none());
    assert!(!registry.evict(&record.id).await.unwrap());
}

#[tokio::test]
async fn test_missing_artifact_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_over(
        Arc::new(MemoryRecordStore::new()),
        Arc::new(FsArtifactStore::new(dir.path())),
        Duration::from_secs(5),
    );
    let record = registry.store(b"gone", ECLevel::L).await.unwrap();
    std::fs::remove_file(dir.path().join(record.image.as_str())).unwrap();

    let err = registry.load_image(&record.id).await.unwrap_err();
    assert!(err.to_string().contains(record.image.as_str()));
}

#[tokio::test]
async fn test_service_scans_uploaded_images() {
    let registry = Arc::new(Registry::in_memory());
    let service = QrService::new(registry.clone(), Arc::new(QrCodec::default()));

    let first = service.generate(b"first", Some(ECLevel::H)).await.unwrap();
    let second = service.generate(b"second", None).await.unwrap();
    assert_ne!(first.record_id, second.record_id);

    let response = service.scan(&second.png, Some(&first.record_id)).await.unwrap();
    assert_eq!(
        response,
        ScanResponse::Decoded {
            text: "second".into()
        }
    );

    let blank = {
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::GrayImage::from_pixel(50, 50, image::Luma([255]))
            .write_to(&mut bytes, image::ImageOutputFormat::Png)
            .unwrap();
        bytes.into_inner()
    };
    let response = service.scan(&blank, Some(&first.record_id)).await.unwrap();
    assert!(matches!(response, ScanResponse::NotFound { .. }));

    let record = registry.lookup_by_id(&first.record_id).await.unwrap().unwrap();
    assert_eq!(record.scan_history.len(), 2);
    assert!(matches!(
        record.last_scan_result,
        Some(ScanOutcome::NotFound { .. })
    ));
    assert!(registry.scan_history(&second.record_id).await.unwrap().is_empty());
}
