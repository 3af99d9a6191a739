use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a recording session is in its lifecycle.
///
/// `Idle → Recording → {Paused ⇄ Recording} → Stopped → Idle (reset)`;
/// no transition skips resource release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    Idle,
    Recording,
    Paused,
    Stopped,
}

/// Observable state of a capture session
#[derive(Debug, Clone, Serialize)]
pub struct CaptureSnapshot {
    pub phase: CapturePhase,

    /// Whole seconds spent recording (frozen while paused)
    pub elapsed_secs: u64,

    /// Number of complete chunks collected so far
    pub chunk_count: usize,

    /// Whether a finalized buffer is available
    pub has_finalized_audio: bool,
}

/// The product of a stopped recording: collected chunks concatenated and
/// encoded as a WAV buffer. Immutable once produced.
#[derive(Debug, Clone)]
pub struct FinalizedAudio {
    pub wav_bytes: Vec<u8>,
    pub duration_secs: u64,
    pub sample_rate: u32,
    pub channels: u16,
    pub mime_type: &'static str,
    pub captured_at: DateTime<Utc>,
}

impl FinalizedAudio {
    /// Default upload filename derived from the capture timestamp.
    pub fn file_name(&self) -> String {
        format!("recording-{}.wav", self.captured_at.format("%Y%m%d-%H%M%S"))
    }
}
