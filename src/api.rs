//! Transport-facing operations.
//!
//! Routing and request parsing belong to the embedding server; this module
//! stops at typed requests and serde-serializable responses.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codec::{ImageDecoder, QrCodec};
use crate::error::ApiError;
use crate::models::{ECLevel, RecordId, ScanOutcome};
use crate::registry::{AUDIT, Registry};

/// Result of generating and storing a symbol
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    /// Id of the new record
    pub record_id: RecordId,
    /// Selected version
    pub version: u8,
    /// Error correction level used
    pub level: ECLevel,
    /// PNG bytes; omitted from JSON in favour of `base64`
    #[serde(skip)]
    pub png: Vec<u8>,
    /// PNG bytes, standard base64
    pub base64: String,
}

impl GenerateResponse {
    /// `data:` URI for embedding the PNG in HTML
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.base64)
    }
}

/// Scan result as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanResponse {
    /// One symbol decoded
    Decoded {
        /// Payload, invalid UTF-8 replaced
        text: String,
    },
    /// Nothing located
    NotFound {
        /// Human-readable stage that gave up
        reason: String,
    },
    /// Several distinct symbols decoded
    Ambiguous {
        /// Every decoded payload
        candidates: Vec<String>,
    },
    /// Located but unreadable
    Corrupt {
        /// Human-readable diagnostics
        detail: String,
    },
}

impl From<&ScanOutcome> for ScanResponse {
    fn from(outcome: &ScanOutcome) -> Self {
        let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
        match outcome {
            ScanOutcome::Decoded { payload } => ScanResponse::Decoded {
                text: text(payload),
            },
            ScanOutcome::NotFound { reason } => ScanResponse::NotFound {
                reason: reason.to_string(),
            },
            ScanOutcome::Ambiguous { candidates } => ScanResponse::Ambiguous {
                candidates: candidates.iter().map(|c| text(c)).collect(),
            },
            ScanOutcome::Corrupt { detail } => ScanResponse::Corrupt {
                detail: detail.to_string(),
            },
        }
    }
}

/// Generate and scan on top of a registry and a decoder
pub struct QrService {
    registry: Arc<Registry>,
    decoder: Arc<dyn ImageDecoder>,
}

impl QrService {
    /// Service over a shared registry and decoder
    pub fn new(registry: Arc<Registry>, decoder: Arc<dyn ImageDecoder>) -> Self {
        Self { registry, decoder }
    }

    /// In-memory registry and the default codec
    pub fn in_memory() -> Self {
        Self::new(Arc::new(Registry::in_memory()), Arc::new(QrCodec::default()))
    }

    /// The registry generated symbols are stored in
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode and store `payload`; `level` defaults to the registry's
    pub async fn generate(
        &self,
        payload: &[u8],
        level: Option<ECLevel>,
    ) -> Result<GenerateResponse, ApiError> {
        let record = match level {
            Some(level) => self.registry.store(payload, level).await?,
            None => self.registry.store_default(payload).await?,
        };
        let png = self.registry.load_image(&record.id).await?;
        Ok(GenerateResponse {
            record_id: record.id,
            version: record.version.number(),
            level: record.ec_level,
            base64: STANDARD.encode(&png),
            png,
        })
    }

    /// Decode an uploaded image; with `record`, also log the scan against it
    pub async fn scan(
        &self,
        image_bytes: &[u8],
        record: Option<&RecordId>,
    ) -> Result<ScanResponse, ApiError> {
        let image = image::load_from_memory(image_bytes)?;
        let outcome = self.decoder.decode(&image);
        debug!(outcome = outcome.label(), width = image.width(), height = image.height(), "scan decoded");

        if let Some(id) = record {
            self.registry.record_scan(id, outcome.clone()).await?;
        }
        Ok(ScanResponse::from(&outcome))
    }

    /// Decode the stored image of record `id` and log the scan against it
    pub async fn scan_record(&self, id: &RecordId) -> Result<ScanResponse, ApiError> {
        let png = self.registry.load_image(id).await?;
        let image = image::load_from_memory(&png)?;
        let outcome = self.decoder.decode(&image);
        self.registry.record_scan(id, outcome.clone()).await?;

        match &outcome {
            ScanOutcome::Decoded { .. } => {
                info!(target: AUDIT, event = "stored_image_scanned", id = %id, "stored image decoded")
            }
            other => warn!(
                target: AUDIT,
                event = "stored_image_unreadable",
                id = %id,
                outcome = other.label(),
                "stored image did not decode"
            ),
        }
        Ok(ScanResponse::from(&outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::models::NotFoundReason;

    #[tokio::test]
    async fn test_generate_then_scan() {
        let service = QrService::in_memory();
        let generated = service.generate(b"https://example.com", None).await.unwrap();
        assert_eq!(generated.level, ECLevel::L);
        assert_eq!(STANDARD.decode(&generated.base64).unwrap(), generated.png);
        assert!(generated.data_uri().starts_with("data:image/png;base64,iVBOR"));

        let response = service
            .scan(&generated.png, Some(&generated.record_id))
            .await
            .unwrap();
        assert_eq!(
            response,
            ScanResponse::Decoded {
                text: "https://example.com".into()
            }
        );

        let history = service
            .registry()
            .scan_history(&generated.record_id)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    /// Decoder that never finds anything
    struct BlindDecoder;

    impl ImageDecoder for BlindDecoder {
        fn decode(&self, _image: &image::DynamicImage) -> ScanOutcome {
            ScanOutcome::NotFound {
                reason: NotFoundReason::TooFewFinders { found: 0 },
            }
        }
    }

    #[tokio::test]
    async fn test_scan_record_reads_stored_image() {
        let service = QrService::in_memory();
        let generated = service
            .generate(b"stored payload", Some(ECLevel::Q))
            .await
            .unwrap();
        assert_eq!(generated.level, ECLevel::Q);

        let response = service.scan_record(&generated.record_id).await.unwrap();
        assert_eq!(
            response,
            ScanResponse::Decoded {
                text: "stored payload".into()
            }
        );

        let record = service
            .registry()
            .lookup_by_id(&generated.record_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.scan_history.len(), 1);
        assert_eq!(
            record.last_scan_result,
            Some(ScanOutcome::Decoded {
                payload: b"stored payload".to_vec()
            })
        );
    }

    #[tokio::test]
    async fn test_scan_record_logs_failures() {
        let registry = Arc::new(Registry::in_memory());
        let service = QrService::new(registry.clone(), Arc::new(BlindDecoder));
        let generated = service.generate(b"unseen", None).await.unwrap();

        let response = service.scan_record(&generated.record_id).await.unwrap();
        assert!(matches!(response, ScanResponse::NotFound { .. }));
        let history = registry.scan_history(&generated.record_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(matches!(history[0].outcome, ScanOutcome::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_scan_record_unknown_id() {
        let service = QrService::in_memory();
        assert!(matches!(
            service.scan_record(&RecordId::random()).await,
            Err(ApiError::Registry(RegistryError::UnknownRecord(_)))
        ));
    }

    #[tokio::test]
    async fn test_scan_rejects_non_images() {
        let service = QrService::in_memory();
        assert!(matches!(
            service.scan(b"definitely not an image", None).await,
            Err(ApiError::Image(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_surfaces_encode_errors() {
        let service = QrService::in_memory();
        assert!(matches!(
            service.generate(b"", Some(ECLevel::H)).await,
            Err(ApiError::Registry(RegistryError::Encode(_)))
        ));
    }

    #[test]
    fn test_scan_response_json_shape() {
        let json = serde_json::to_value(ScanResponse::from(&ScanOutcome::Decoded {
            payload: b"hi".to_vec(),
        }))
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "decoded", "text": "hi"}));

        let json = serde_json::to_value(ScanResponse::from(&ScanOutcome::Ambiguous {
            candidates: vec![b"a".to_vec(), b"b".to_vec()],
        }))
        .unwrap();
        assert_eq!(json["status"], "ambiguous");
        assert_eq!(json["candidates"], serde_json::json!(["a", "b"]));

        let json = serde_json::to_value(ScanResponse::from(&ScanOutcome::NotFound {
            reason: NotFoundReason::TooFewFinders { found: 2 },
        }))
        .unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["reason"], "found 2 finder patterns, need 3");
    }
}
