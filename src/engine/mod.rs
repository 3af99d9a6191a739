//! Remote speech-to-text engine contract.
//!
//! The engine is an opaque HTTP service: audio bytes go in as a multipart
//! upload, text and detected language come back. Implement `Transcriber`
//! to add other backends.

mod remote;

pub use remote::HttpTranscriber;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A transcription result as returned by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// Detected language (ISO 639-1 code)
    pub language: String,
    /// Optional per-segment timing; empty when the engine omits it
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<TranscriptSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

/// Errors from a transcription attempt. Both variants are retryable
/// without changing the input.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Non-2xx response from the engine
    #[error("engine returned status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Transport failure, including the bounded request timeout
    #[error("engine request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio payload to text.
    async fn transcribe(
        &self,
        audio: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<Transcript, EngineError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
