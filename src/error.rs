//! Error taxonomies for the capture and submission pipelines.
//!
//! Each variant is distinguishable by the caller: `RateLimited` and
//! `Engine` are retryable without changing input, `PayloadInvalid` and
//! `DeviceUnavailable` need different input or permissions, the rest are
//! operational failures.

use thiserror::Error;

use crate::engine::EngineError;
use crate::records::PersistError;

/// Client-side capture failures.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Permission denied or no capture device present; state stays `Idle`.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Collected chunks could not be encoded into a WAV buffer.
    #[error("failed to finalize recording: {0}")]
    Finalize(String),
}

/// Server-side submission failures, one per pipeline stage.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("invalid payload: {0}")]
    PayloadInvalid(String),

    #[error("artifact storage failed: {0}")]
    Storage(anyhow::Error),

    #[error("transcription engine failed: {0}")]
    Engine(#[source] EngineError),

    #[error("failed to persist transcription record: {0}")]
    Persistence(#[source] PersistError),
}
