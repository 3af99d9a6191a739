//! Recording capture pipeline
//!
//! This module provides the capture state machine and its periphery:
//! - `CaptureController`: record / pause / resume / stop / reset over an
//!   audio backend, with a 1 Hz elapsed tick, fixed-cadence chunk
//!   collection, auto-stop, and idempotent teardown
//! - `CaptureFeed`: read-only view for monitoring tasks
//! - `WaveformMonitor`: self-terminating amplitude rendering loop

mod controller;
mod state;
mod waveform;

pub use controller::{CaptureConfig, CaptureController, CaptureFeed};
pub use state::{CapturePhase, CaptureSnapshot, FinalizedAudio};
pub use waveform::{ConsoleWaveform, WaveformMonitor, WaveformSink};
