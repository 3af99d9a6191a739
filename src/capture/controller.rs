use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::audio::{AudioBackend, AudioBackendConfig, AudioFrame};
use crate::error::CaptureError;

use super::state::{CapturePhase, CaptureSnapshot, FinalizedAudio};

const LEVEL_HISTORY: usize = 64;

/// Controller-level capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Cadence of chunk collection while recording
    pub chunk_interval: Duration,
    /// Recording length that triggers auto-stop
    pub max_duration_secs: u64,
    /// Hand finalized audio to the configured sink as soon as capture stops
    pub auto_save: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            chunk_interval: Duration::from_secs(1),
            max_duration_secs: 600, // 10 minutes
            auto_save: true,
        }
    }
}

struct CaptureState {
    phase: CapturePhase,
    chunks: Vec<Vec<i16>>,
    pending: Vec<i16>,
    finalized: Option<FinalizedAudio>,
}

struct CaptureShared {
    config: CaptureConfig,
    stream_config: AudioBackendConfig,
    backend: Mutex<Box<dyn AudioBackend>>,
    state: StdMutex<CaptureState>,
    elapsed_secs: AtomicU64,
    paused: AtomicBool,
    /// True while a session is live (Recording or Paused); every spawned
    /// task observes this before acting
    active: AtomicBool,
    /// Generation counter; bumped by reset() so stale tasks and
    /// late-resolving stream acquisitions degrade to no-ops
    epoch: AtomicU64,
    levels: StdMutex<VecDeque<f32>>,
    tick_task: Mutex<Option<JoinHandle<()>>>,
    collect_task: Mutex<Option<JoinHandle<()>>>,
    finalized_tx: Option<mpsc::Sender<FinalizedAudio>>,
}

/// The record/pause/stop state machine over an audio backend.
///
/// Owns the hardware stream and every task it spawns: the 1 Hz tick, the
/// chunk collector, and (via `CaptureFeed`) the waveform loop all check
/// session state each iteration, so teardown from any path releases
/// everything.
pub struct CaptureController {
    shared: Arc<CaptureShared>,
}

impl CaptureController {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        stream_config: AudioBackendConfig,
        config: CaptureConfig,
    ) -> Self {
        Self::with_finalized_sink(backend, stream_config, config, None)
    }

    /// Like `new`, with a sink that receives finalized audio on stop when
    /// auto-save is enabled.
    pub fn with_finalized_sink(
        backend: Box<dyn AudioBackend>,
        stream_config: AudioBackendConfig,
        config: CaptureConfig,
        finalized_tx: Option<mpsc::Sender<FinalizedAudio>>,
    ) -> Self {
        Self {
            shared: Arc::new(CaptureShared {
                config,
                stream_config,
                backend: Mutex::new(backend),
                state: StdMutex::new(CaptureState {
                    phase: CapturePhase::Idle,
                    chunks: Vec::new(),
                    pending: Vec::new(),
                    finalized: None,
                }),
                elapsed_secs: AtomicU64::new(0),
                paused: AtomicBool::new(false),
                active: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                levels: StdMutex::new(VecDeque::with_capacity(LEVEL_HISTORY)),
                tick_task: Mutex::new(None),
                collect_task: Mutex::new(None),
                finalized_tx,
            }),
        }
    }

    /// Acquire the hardware stream and begin recording.
    ///
    /// Valid from `Idle` or `Stopped` (a new take discards the previous
    /// finalized buffer); a warned no-op while a session is live. On
    /// failure the state stays `Idle` and nothing is held.
    pub async fn start(&self) -> Result<(), CaptureError> {
        {
            let state = self.shared.state.lock().unwrap();
            if matches!(state.phase, CapturePhase::Recording | CapturePhase::Paused) {
                warn!("Recording already started");
                return Ok(());
            }
        }

        let epoch = self.shared.epoch.load(Ordering::SeqCst);

        // Stream acquisition can take arbitrarily long; a reset() issued
        // before it resolves invalidates this epoch.
        let rx = {
            let mut backend = self.shared.backend.lock().await;
            backend
                .start()
                .await
                .map_err(|e| CaptureError::DeviceUnavailable(format!("{e:#}")))?
        };

        if self.shared.epoch.load(Ordering::SeqCst) != epoch {
            info!("Capture reset while acquiring stream, releasing it");
            let mut backend = self.shared.backend.lock().await;
            if let Err(e) = backend.stop().await {
                warn!("Failed to release late-arriving stream: {e:#}");
            }
            return Ok(());
        }

        {
            let mut state = self.shared.state.lock().unwrap();
            state.phase = CapturePhase::Recording;
            state.chunks.clear();
            state.pending.clear();
            state.finalized = None;
        }
        self.shared.elapsed_secs.store(0, Ordering::SeqCst);
        self.shared.paused.store(false, Ordering::SeqCst);
        self.shared.active.store(true, Ordering::SeqCst);
        self.shared.levels.lock().unwrap().clear();

        let collect = tokio::spawn(collect_loop(Arc::clone(&self.shared), rx, epoch));
        {
            let mut handle = self.shared.collect_task.lock().await;
            *handle = Some(collect);
        }

        let tick = tokio::spawn(tick_loop(Arc::clone(&self.shared), epoch));
        {
            let mut handle = self.shared.tick_task.lock().await;
            *handle = Some(tick);
        }

        info!("Recording started");
        Ok(())
    }

    /// Freeze the tick and suspend chunk collection without releasing the
    /// stream. No-op outside `Recording`.
    pub fn pause(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if state.phase == CapturePhase::Recording {
            state.phase = CapturePhase::Paused;
            self.shared.paused.store(true, Ordering::SeqCst);
            info!("Recording paused");
        }
    }

    /// Restart the tick and chunk collection. No-op outside `Paused`.
    pub fn resume(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if state.phase == CapturePhase::Paused {
            state.phase = CapturePhase::Recording;
            self.shared.paused.store(false, Ordering::SeqCst);
            info!("Recording resumed");
        }
    }

    /// Stop recording: release the stream, cancel the tick, concatenate the
    /// collected chunks into a finalized WAV buffer.
    ///
    /// Valid from `Recording` or `Paused`; returns `None` as a no-op from
    /// any other phase.
    pub async fn stop(&self) -> Result<Option<FinalizedAudio>, CaptureError> {
        CaptureShared::stop_session(Arc::clone(&self.shared)).await
    }

    /// Release every held resource and return to `Idle`. Safe to call from
    /// any state, repeatedly, including while `start()` is still waiting on
    /// the stream.
    pub async fn reset(&self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared.active.store(false, Ordering::SeqCst);
        self.shared.paused.store(false, Ordering::SeqCst);

        if let Some(task) = self.shared.collect_task.lock().await.take() {
            task.abort();
        }
        if let Some(task) = self.shared.tick_task.lock().await.take() {
            task.abort();
        }

        {
            let mut backend = self.shared.backend.lock().await;
            if let Err(e) = backend.stop().await {
                warn!("Failed to release audio stream on reset: {e:#}");
            }
        }

        {
            let mut state = self.shared.state.lock().unwrap();
            state.phase = CapturePhase::Idle;
            state.chunks.clear();
            state.pending.clear();
            state.finalized = None;
        }
        self.shared.elapsed_secs.store(0, Ordering::SeqCst);
        self.shared.levels.lock().unwrap().clear();

        info!("Capture reset");
    }

    pub fn phase(&self) -> CapturePhase {
        self.shared.state.lock().unwrap().phase
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.shared.elapsed_secs.load(Ordering::SeqCst)
    }

    pub fn finalized(&self) -> Option<FinalizedAudio> {
        self.shared.state.lock().unwrap().finalized.clone()
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        let state = self.shared.state.lock().unwrap();
        CaptureSnapshot {
            phase: state.phase,
            elapsed_secs: self.shared.elapsed_secs.load(Ordering::SeqCst),
            chunk_count: state.chunks.len(),
            has_finalized_audio: state.finalized.is_some(),
        }
    }

    /// Read-only view for monitoring tasks (waveform rendering).
    pub fn feed(&self) -> CaptureFeed {
        CaptureFeed {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared.active.store(false, Ordering::SeqCst);

        if let Ok(mut guard) = self.shared.collect_task.try_lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
        if let Ok(mut guard) = self.shared.tick_task.try_lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }

        // The stream release is async; hand it to the runtime if one is
        // still around.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let shared = Arc::clone(&self.shared);
            handle.spawn(async move {
                let mut backend = shared.backend.lock().await;
                if let Err(e) = backend.stop().await {
                    warn!("Failed to release audio stream on teardown: {e:#}");
                }
            });
        }
    }
}

impl CaptureShared {
    async fn stop_session(shared: Arc<Self>) -> Result<Option<FinalizedAudio>, CaptureError> {
        // swap gives exactly-once stop under concurrent callers
        if !shared.active.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        shared.paused.store(false, Ordering::SeqCst);

        {
            let mut backend = shared.backend.lock().await;
            if let Err(e) = backend.stop().await {
                warn!("Failed to release audio stream: {e:#}");
            }
        }

        // The collector drains once the stream channel closes; wait for it
        // so no received frame is lost from the finalized buffer.
        if let Some(task) = shared.collect_task.lock().await.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Chunk collection task panicked: {e}");
                }
            }
        }
        if let Some(task) = shared.tick_task.lock().await.take() {
            task.abort();
        }

        let elapsed = shared.elapsed_secs.load(Ordering::SeqCst);
        let finalized = {
            let mut state = shared.state.lock().unwrap();

            let remainder = std::mem::take(&mut state.pending);
            if !remainder.is_empty() {
                state.chunks.push(remainder);
            }

            let wav_bytes = encode_wav(
                &state.chunks,
                shared.stream_config.target_sample_rate,
                shared.stream_config.target_channels,
            )
            .map_err(|e| CaptureError::Finalize(e.to_string()))?;

            let finalized = FinalizedAudio {
                wav_bytes,
                duration_secs: elapsed,
                sample_rate: shared.stream_config.target_sample_rate,
                channels: shared.stream_config.target_channels,
                mime_type: "audio/wav",
                captured_at: Utc::now(),
            };
            state.finalized = Some(finalized.clone());
            state.phase = CapturePhase::Stopped;
            finalized
        };

        info!(
            "Recording stopped: {}s, {} bytes",
            finalized.duration_secs,
            finalized.wav_bytes.len()
        );

        if shared.config.auto_save {
            if let Some(tx) = &shared.finalized_tx {
                if tx.try_send(finalized.clone()).is_err() {
                    warn!("Finalized audio sink is full or closed, dropping auto-save");
                }
            }
        }

        Ok(Some(finalized))
    }
}

/// Read-only view of a capture session for monitoring tasks.
#[derive(Clone)]
pub struct CaptureFeed {
    shared: Arc<CaptureShared>,
}

impl CaptureFeed {
    /// Whether a session is live (Recording or Paused)
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::SeqCst)
    }

    /// Recent per-frame peak amplitudes, oldest first, in `0.0..=1.0`
    pub fn levels(&self) -> Vec<f32> {
        self.shared.levels.lock().unwrap().iter().copied().collect()
    }
}

async fn collect_loop(
    shared: Arc<CaptureShared>,
    mut rx: mpsc::Receiver<AudioFrame>,
    epoch: u64,
) {
    let chunk_samples = (shared.stream_config.target_sample_rate as u64
        * shared.stream_config.target_channels as u64
        * shared.config.chunk_interval.as_secs().max(1)) as usize;

    while let Some(frame) = rx.recv().await {
        if shared.epoch.load(Ordering::SeqCst) != epoch || !shared.active.load(Ordering::SeqCst) {
            break;
        }

        // Paused sessions keep the stream open but collect nothing
        if shared.paused.load(Ordering::SeqCst) {
            continue;
        }

        let peak = frame
            .samples
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0);
        {
            let mut levels = shared.levels.lock().unwrap();
            if levels.len() == LEVEL_HISTORY {
                levels.pop_front();
            }
            levels.push_back(peak as f32 / i16::MAX as f32);
        }

        let mut state = shared.state.lock().unwrap();
        state.pending.extend_from_slice(&frame.samples);
        while state.pending.len() >= chunk_samples {
            let rest = state.pending.split_off(chunk_samples);
            let chunk = std::mem::replace(&mut state.pending, rest);
            state.chunks.push(chunk);
        }
    }

    // Upstream closed the stream while we were still live: finalize the
    // take instead of leaving the session dangling.
    if shared.epoch.load(Ordering::SeqCst) == epoch && shared.active.load(Ordering::SeqCst) {
        info!("Audio stream ended, stopping capture");
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            if let Err(e) = CaptureShared::stop_session(shared).await {
                warn!("Failed to finalize capture after stream end: {e}");
            }
        });
    }
}

async fn tick_loop(shared: Arc<CaptureShared>, epoch: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // immediate first tick

    loop {
        interval.tick().await;

        if shared.epoch.load(Ordering::SeqCst) != epoch || !shared.active.load(Ordering::SeqCst) {
            break;
        }
        if shared.paused.load(Ordering::SeqCst) {
            continue;
        }

        let elapsed = shared.elapsed_secs.fetch_add(1, Ordering::SeqCst) + 1;

        if elapsed >= shared.config.max_duration_secs {
            info!("Max recording duration reached ({elapsed}s), stopping");
            let shared = Arc::clone(&shared);
            tokio::spawn(async move {
                if let Err(e) = CaptureShared::stop_session(shared).await {
                    warn!("Auto-stop failed to finalize capture: {e}");
                }
            });
            break;
        }
    }
}

fn encode_wav(chunks: &[Vec<i16>], sample_rate: u32, channels: u16) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for chunk in chunks {
            for &sample in chunk {
                writer.write_sample(sample)?;
            }
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
