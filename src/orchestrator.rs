//! Submission orchestration: admit, store, transcribe, persist, cache.
//!
//! Each submission is an independent sequential pipeline. Compensation is
//! the failure-handling discipline: a side effect created by an earlier
//! step is unwound when a later step fails, except where unwinding would
//! destroy the only copy of the audio (persistence failure).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::cache::{record_key, ResultCache};
use crate::engine::Transcriber;
use crate::error::SubmitError;
use crate::gate::{Admission, UploadGate};
use crate::records::{NewRecord, RecordStore, TranscriptionRecord};
use crate::storage::ArtifactStore;

/// One transcription submission.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub owner_id: String,
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
    pub folder_id: Option<String>,
    pub title: Option<String>,
}

/// What the caller gets back from a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: String,
    pub text: String,
    pub language: String,
    pub title: String,
    pub audio_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<&TranscriptionRecord> for RecordSummary {
    fn from(record: &TranscriptionRecord) -> Self {
        Self {
            id: record.id.clone(),
            text: record.original_text.clone(),
            language: record.language.clone(),
            title: record.title.clone(),
            audio_url: record.audio_url.clone(),
            created_at: record.created_at,
        }
    }
}

/// Deletes the artifact if the submission is abandoned mid-pipeline
/// (future dropped on client disconnect). Disarmed at the persistence
/// boundary: after that the record may reference the artifact.
struct ArtifactGuard {
    store: Arc<dyn ArtifactStore>,
    key: Option<String>,
}

impl ArtifactGuard {
    fn new(store: Arc<dyn ArtifactStore>, key: String) -> Self {
        Self {
            store,
            key: Some(key),
        }
    }

    fn disarm(&mut self) -> Option<String> {
        self.key.take()
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let store = Arc::clone(&self.store);
                handle.spawn(async move {
                    if let Err(e) = store.delete(&key).await {
                        warn!("Failed to delete abandoned artifact {key}: {e:#}");
                    }
                });
            } else {
                warn!("Runtime gone, artifact {key} left for reconciliation");
            }
        }
    }
}

pub struct TranscriptionOrchestrator {
    gate: UploadGate,
    artifacts: Arc<dyn ArtifactStore>,
    engine: Arc<dyn Transcriber>,
    records: Arc<dyn RecordStore>,
    cache: Arc<dyn ResultCache>,
    max_upload_bytes: u64,
    cache_ttl: Duration,
}

impl TranscriptionOrchestrator {
    pub fn new(
        gate: UploadGate,
        artifacts: Arc<dyn ArtifactStore>,
        engine: Arc<dyn Transcriber>,
        records: Arc<dyn RecordStore>,
        cache: Arc<dyn ResultCache>,
        max_upload_bytes: u64,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            gate,
            artifacts,
            engine,
            records,
            cache,
            max_upload_bytes,
            cache_ttl,
        }
    }

    /// Run one submission through the pipeline.
    pub async fn submit(&self, req: TranscriptionRequest) -> Result<RecordSummary, SubmitError> {
        // 1. Validate before any side effect
        if req.bytes.is_empty() {
            return Err(SubmitError::PayloadInvalid(
                "no audio file provided".to_string(),
            ));
        }
        if req.bytes.len() as u64 > self.max_upload_bytes {
            return Err(SubmitError::PayloadInvalid(format!(
                "file size {} exceeds the {} byte limit",
                req.bytes.len(),
                self.max_upload_bytes
            )));
        }
        if !req.mime_type.starts_with("audio/") {
            return Err(SubmitError::PayloadInvalid(format!(
                "invalid file type {}, expected audio/*",
                req.mime_type
            )));
        }

        // 2. Admission, before any storage or compute work
        if let Admission::Denied { retry_after } = self.gate.admit(&req.owner_id).await {
            return Err(SubmitError::RateLimited {
                retry_after_secs: retry_after.as_secs(),
            });
        }

        // 3. Durable upload
        let artifact = self
            .artifacts
            .put(&req.bytes, &req.file_name, &req.mime_type, &req.owner_id)
            .await
            .map_err(SubmitError::Storage)?;
        let mut guard = ArtifactGuard::new(Arc::clone(&self.artifacts), artifact.key.clone());

        // 4. Engine invocation; a failed transcription must never leave an
        //    orphaned artifact behind
        let transcript = match self
            .engine
            .transcribe(&req.bytes, &req.file_name, &req.mime_type)
            .await
        {
            Ok(transcript) => transcript,
            Err(e) => {
                if let Some(key) = guard.disarm() {
                    if let Err(del) = self.artifacts.delete(&key).await {
                        warn!("Failed to delete artifact {key} after engine failure: {del:#}");
                    }
                }
                return Err(SubmitError::Engine(e));
            }
        };

        // 5. Persist. The artifact stays put on failure: the engine output
        //    only exists in memory here and the stored audio is its sole
        //    durable copy.
        let title = req
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Recording {}", Utc::now().format("%Y-%m-%d %H:%M:%S")));

        let new_record = NewRecord {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: req.owner_id.clone(),
            folder_id: req.folder_id.clone(),
            title,
            original_text: transcript.text,
            audio_url: artifact.url.clone(),
            language: transcript.language,
            metadata: json!({
                "artifact_key": artifact.key,
                "original_file_name": req.file_name,
                "size_bytes": req.bytes.len(),
                "mime_type": req.mime_type,
                "transcribed_at": Utc::now().to_rfc3339(),
            }),
        };

        let _ = guard.disarm();
        let record = match self.records.create(new_record).await {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "Record persistence failed, artifact {} left for reconciliation: {e}",
                    artifact.key
                );
                return Err(SubmitError::Persistence(e));
            }
        };

        // 6. Cache warm, best-effort
        if let Err(e) = self
            .cache
            .put(&record_key(&record.id), &record, self.cache_ttl)
            .await
        {
            warn!("Cache warm failed for {}: {e:#}", record.id);
        }

        info!(
            "Transcription {} persisted for {} ({} chars, {})",
            record.id,
            record.owner_id,
            record.original_text.len(),
            record.language
        );

        Ok(RecordSummary::from(&record))
    }
}
