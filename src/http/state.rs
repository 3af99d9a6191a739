use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::cache::{MemoryResultCache, ResultCache};
use crate::config::Config;
use crate::engine::HttpTranscriber;
use crate::gate::{MemoryCounterStore, UploadGate};
use crate::orchestrator::TranscriptionOrchestrator;
use crate::records::{MemoryRecordStore, RecordStore};
use crate::storage::FsArtifactStore;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TranscriptionOrchestrator>,
    pub records: Arc<dyn RecordStore>,
    pub cache: Arc<dyn ResultCache>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Assemble the default component stack: filesystem artifacts, remote
    /// HTTP engine, in-process gate counters, records, and cache.
    pub fn new(config: Config) -> Result<Self> {
        let artifacts = Arc::new(FsArtifactStore::new(
            &config.storage.root,
            &config.storage.public_base,
        ));
        let engine = Arc::new(HttpTranscriber::new(
            &config.engine.base_url,
            Duration::from_secs(config.engine.timeout_secs),
        )?);
        let gate = UploadGate::new(
            Arc::new(MemoryCounterStore::new()),
            "transcribe",
            Duration::from_millis(config.upload.rate_limit.window_ms),
            config.upload.rate_limit.max_requests,
        );
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let cache: Arc<dyn ResultCache> = Arc::new(MemoryResultCache::new());

        let orchestrator = Arc::new(TranscriptionOrchestrator::new(
            gate,
            artifacts,
            engine,
            Arc::clone(&records),
            Arc::clone(&cache),
            config.upload.max_bytes,
            Duration::from_secs(config.cache.ttl_secs),
        ));

        Ok(Self {
            orchestrator,
            records,
            cache,
            config: Arc::new(config),
        })
    }
}
