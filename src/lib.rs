pub mod audio;
pub mod cache;
pub mod capture;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod http;
pub mod orchestrator;
pub mod records;
pub mod storage;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFrame, AudioSource,
    FileBackend,
};
pub use cache::{MemoryResultCache, ResultCache};
pub use capture::{
    CaptureConfig, CaptureController, CaptureFeed, CapturePhase, CaptureSnapshot, ConsoleWaveform,
    FinalizedAudio, WaveformMonitor, WaveformSink,
};
pub use client::ApiClient;
pub use config::Config;
pub use engine::{EngineError, HttpTranscriber, Transcriber, Transcript, TranscriptSegment};
pub use error::{CaptureError, SubmitError};
pub use gate::{Admission, CounterStore, MemoryCounterStore, UploadGate};
pub use http::{create_router, AppState};
pub use orchestrator::{RecordSummary, TranscriptionOrchestrator, TranscriptionRequest};
pub use records::{MemoryRecordStore, NewRecord, PersistError, RecordStore, TranscriptionRecord};
pub use storage::{ArtifactStore, FsArtifactStore, StoredArtifact};
