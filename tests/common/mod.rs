#![allow(dead_code)]

// Mock implementations of the pipeline seams, shared across the
// integration test binaries. They count invocations and return canned
// results so tests can assert exactly which side effects happened.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Notify};

use voicenotes::{
    Admission, ArtifactStore, AudioBackend, AudioFrame, CounterStore, EngineError,
    MemoryCounterStore, MemoryRecordStore, MemoryResultCache, NewRecord, PersistError,
    RecordStore, ResultCache, StoredArtifact, Transcriber, Transcript, TranscriptionOrchestrator,
    TranscriptionRecord, TranscriptionRequest, UploadGate,
};

// ============================================================================
// Audio backend mocks
// ============================================================================

/// Scripted stand-in for a hardware stream. The test handle feeds frames
/// in; `stop()` closes the live channel and re-arms for a next session.
pub struct MockBackend {
    rx: Option<mpsc::Receiver<AudioFrame>>,
    tx_slot: Arc<Mutex<Option<mpsc::Sender<AudioFrame>>>>,
    fail_start: bool,
    capturing: bool,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

#[derive(Clone)]
pub struct MockBackendHandle {
    tx_slot: Arc<Mutex<Option<mpsc::Sender<AudioFrame>>>>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl MockBackendHandle {
    /// Feed one frame of 16kHz mono audio. Returns false once the stream
    /// channel is closed or full.
    pub fn feed(&self, samples: Vec<i16>) -> bool {
        let tx = self.tx_slot.lock().unwrap().clone();
        match tx {
            Some(tx) => tx
                .try_send(AudioFrame {
                    samples,
                    sample_rate: 16000,
                    channels: 1,
                    timestamp_ms: 0,
                })
                .is_ok(),
            None => false,
        }
    }

    /// Successful stream acquisitions
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Stream releases (a release is counted once per live stream)
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl MockBackend {
    pub fn new() -> (Self, MockBackendHandle) {
        Self::build(false)
    }

    /// A backend whose acquisition always fails (no device / permission).
    pub fn failing() -> (Self, MockBackendHandle) {
        Self::build(true)
    }

    fn build(fail_start: bool) -> (Self, MockBackendHandle) {
        let (tx, rx) = mpsc::channel(256);
        let tx_slot = Arc::new(Mutex::new(Some(tx)));
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));

        let handle = MockBackendHandle {
            tx_slot: Arc::clone(&tx_slot),
            starts: Arc::clone(&starts),
            stops: Arc::clone(&stops),
        };

        (
            Self {
                rx: Some(rx),
                tx_slot,
                fail_start,
                capturing: false,
                starts,
                stops,
            },
            handle,
        )
    }
}

#[async_trait::async_trait]
impl AudioBackend for MockBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.fail_start {
            anyhow::bail!("no capture device available");
        }

        let rx = self.rx.take().context("stream already acquired")?;
        self.capturing = true;
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if self.capturing {
            self.capturing = false;
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        // Drop the live sender so the frame channel closes, then re-arm
        // for a possible next session.
        if self.rx.is_none() {
            let (tx, rx) = mpsc::channel(256);
            *self.tx_slot.lock().unwrap() = Some(tx);
            self.rx = Some(rx);
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Wraps a backend so acquisition blocks until the test releases it;
/// models a hardware stream that takes arbitrary wall-clock time.
pub struct GatedBackend {
    inner: MockBackend,
    gate: Arc<Notify>,
}

impl GatedBackend {
    pub fn new(inner: MockBackend, gate: Arc<Notify>) -> Self {
        Self { inner, gate }
    }
}

#[async_trait::async_trait]
impl AudioBackend for GatedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        self.gate.notified().await;
        self.inner.start().await
    }

    async fn stop(&mut self) -> Result<()> {
        self.inner.stop().await
    }

    fn is_capturing(&self) -> bool {
        self.inner.is_capturing()
    }

    fn name(&self) -> &str {
        "gated-mock"
    }
}

// ============================================================================
// Orchestration mocks
// ============================================================================

pub struct MockEngine {
    calls: Arc<AtomicUsize>,
    text: String,
    language: String,
    fail: bool,
    hang: Option<Arc<Notify>>,
}

#[async_trait::async_trait]
impl Transcriber for MockEngine {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _file_name: &str,
        _mime_type: &str,
    ) -> std::result::Result<Transcript, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.hang {
            gate.notified().await;
        }
        if self.fail {
            return Err(EngineError::Status {
                status: 503,
                detail: "model overloaded".to_string(),
            });
        }

        Ok(Transcript {
            text: self.text.clone(),
            language: self.language.clone(),
            segments: Vec::new(),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub struct MockArtifactStore {
    puts: Arc<AtomicUsize>,
    deletes: Arc<Mutex<Vec<String>>>,
    fail_put: bool,
    fail_delete: bool,
}

#[async_trait::async_trait]
impl ArtifactStore for MockArtifactStore {
    async fn put(
        &self,
        _bytes: &[u8],
        file_name: &str,
        _mime_type: &str,
        owner_id: &str,
    ) -> Result<StoredArtifact> {
        if self.fail_put {
            anyhow::bail!("object store unreachable");
        }

        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        let key = format!("{owner_id}/upload-{n}-{file_name}");
        Ok(StoredArtifact {
            url: format!("/artifacts/{key}"),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.deletes.lock().unwrap().push(key.to_string());
        if self.fail_delete {
            anyhow::bail!("object store unreachable");
        }
        Ok(())
    }
}

/// Record store that always fails creation with a backend fault.
pub struct FailingRecordStore;

#[async_trait::async_trait]
impl RecordStore for FailingRecordStore {
    async fn create(
        &self,
        _record: NewRecord,
    ) -> std::result::Result<TranscriptionRecord, PersistError> {
        Err(PersistError::Backend("database unavailable".to_string()))
    }

    async fn get(
        &self,
        _owner_id: &str,
        _id: &str,
    ) -> std::result::Result<Option<TranscriptionRecord>, PersistError> {
        Ok(None)
    }
}

pub struct FailingCache;

#[async_trait::async_trait]
impl ResultCache for FailingCache {
    async fn put(
        &self,
        _key: &str,
        _record: &TranscriptionRecord,
        _ttl: Duration,
    ) -> Result<()> {
        anyhow::bail!("cache unreachable")
    }

    async fn get(&self, _key: &str) -> Result<Option<TranscriptionRecord>> {
        Ok(None)
    }
}

/// Counter store wrapper that counts admission checks.
pub struct CountingCounterStore {
    inner: MemoryCounterStore,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl CounterStore for CountingCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<(u32, Duration)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.increment(key, window).await
    }
}

// ============================================================================
// Pipeline assembly
// ============================================================================

/// A fully mocked orchestration pipeline plus the probes the tests
/// assert against.
pub struct Pipeline {
    pub orchestrator: Arc<TranscriptionOrchestrator>,
    pub engine_calls: Arc<AtomicUsize>,
    pub gate_calls: Arc<AtomicUsize>,
    pub puts: Arc<AtomicUsize>,
    pub deletes: Arc<Mutex<Vec<String>>>,
    pub records: Arc<MemoryRecordStore>,
    pub cache: Arc<MemoryResultCache>,
}

pub struct PipelineBuilder {
    engine_fail: bool,
    engine_hang: Option<Arc<Notify>>,
    fail_put: bool,
    fail_delete: bool,
    fail_persist: bool,
    fail_cache: bool,
    max_requests: u32,
    max_upload_bytes: u64,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            engine_fail: false,
            engine_hang: None,
            fail_put: false,
            fail_delete: false,
            fail_persist: false,
            fail_cache: false,
            max_requests: 10,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }

    pub fn engine_fails(mut self) -> Self {
        self.engine_fail = true;
        self
    }

    pub fn engine_hangs(mut self, gate: Arc<Notify>) -> Self {
        self.engine_hang = Some(gate);
        self
    }

    pub fn storage_fails(mut self) -> Self {
        self.fail_put = true;
        self
    }

    pub fn delete_fails(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn persistence_fails(mut self) -> Self {
        self.fail_persist = true;
        self
    }

    pub fn cache_fails(mut self) -> Self {
        self.fail_cache = true;
        self
    }

    pub fn max_requests(mut self, max: u32) -> Self {
        self.max_requests = max;
        self
    }

    pub fn build(self) -> Pipeline {
        let engine_calls = Arc::new(AtomicUsize::new(0));
        let gate_calls = Arc::new(AtomicUsize::new(0));
        let puts = Arc::new(AtomicUsize::new(0));
        let deletes = Arc::new(Mutex::new(Vec::new()));

        let engine = Arc::new(MockEngine {
            calls: Arc::clone(&engine_calls),
            text: "hello world".to_string(),
            language: "en".to_string(),
            fail: self.engine_fail,
            hang: self.engine_hang,
        });

        let artifacts = Arc::new(MockArtifactStore {
            puts: Arc::clone(&puts),
            deletes: Arc::clone(&deletes),
            fail_put: self.fail_put,
            fail_delete: self.fail_delete,
        });

        let gate = UploadGate::new(
            Arc::new(CountingCounterStore {
                inner: MemoryCounterStore::new(),
                calls: Arc::clone(&gate_calls),
            }),
            "transcribe",
            Duration::from_millis(60_000),
            self.max_requests,
        );

        let records = Arc::new(MemoryRecordStore::new());
        let record_store: Arc<dyn RecordStore> = if self.fail_persist {
            Arc::new(FailingRecordStore)
        } else {
            Arc::clone(&records) as Arc<dyn RecordStore>
        };

        let cache = Arc::new(MemoryResultCache::new());
        let result_cache: Arc<dyn ResultCache> = if self.fail_cache {
            Arc::new(FailingCache)
        } else {
            Arc::clone(&cache) as Arc<dyn ResultCache>
        };

        let orchestrator = Arc::new(TranscriptionOrchestrator::new(
            gate,
            artifacts,
            engine,
            record_store,
            result_cache,
            self.max_upload_bytes,
            Duration::from_secs(3600),
        ));

        Pipeline {
            orchestrator,
            engine_calls,
            gate_calls,
            puts,
            deletes,
            records,
            cache,
        }
    }
}

impl Pipeline {
    pub fn engine_call_count(&self) -> usize {
        self.engine_calls.load(Ordering::SeqCst)
    }

    pub fn gate_call_count(&self) -> usize {
        self.gate_calls.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

pub fn audio_request(owner_id: &str, size: usize) -> TranscriptionRequest {
    TranscriptionRequest {
        owner_id: owner_id.to_string(),
        bytes: vec![0u8; size],
        file_name: "note.wav".to_string(),
        mime_type: "audio/wav".to_string(),
        folder_id: None,
        title: None,
    }
}

pub fn make_record(id: &str, owner_id: &str) -> TranscriptionRecord {
    TranscriptionRecord {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        folder_id: None,
        title: format!("Recording {id}"),
        original_text: "some words".to_string(),
        audio_url: format!("/artifacts/{owner_id}/{id}.wav"),
        language: "en".to_string(),
        is_favorite: false,
        metadata: serde_json::json!({}),
        created_at: chrono::Utc::now(),
    }
}

/// Allow `Admission` assertions to read naturally in tests.
pub fn is_denied(admission: &Admission) -> bool {
    !admission.is_allowed()
}
