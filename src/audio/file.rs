use anyhow::{Context, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::backend::{downsample, stereo_to_mono, AudioBackend, AudioBackendConfig, AudioFrame};

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Normalize to the given rate and channel count (decimation + channel
    /// sum; upsampling and >2 channels are rejected).
    pub fn normalize(&self, target_rate: u32, target_channels: u16) -> Result<Vec<i16>> {
        if self.sample_rate < target_rate {
            anyhow::bail!(
                "cannot upsample {}Hz audio to {}Hz",
                self.sample_rate,
                target_rate
            );
        }
        if self.channels > 2 {
            anyhow::bail!("unsupported channel count: {}", self.channels);
        }

        let mono = if self.channels == 2 && target_channels == 1 {
            stereo_to_mono(&self.samples)
        } else {
            self.samples.clone()
        };

        Ok(downsample(&mono, self.sample_rate, target_rate))
    }
}

/// Replays a WAV file as a paced live audio stream.
///
/// Stands in for a hardware stream where no platform capture backend is
/// available; frames arrive at the configured buffer cadence and the
/// channel closes at end of file or on `stop()`.
pub struct FileBackend {
    path: PathBuf,
    config: AudioBackendConfig,
    capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl FileBackend {
    pub fn new(path: PathBuf, config: AudioBackendConfig) -> Self {
        Self {
            path,
            config,
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let audio = AudioFile::open(&self.path)?;
        let samples = audio.normalize(self.config.target_sample_rate, self.config.target_channels)?;

        let sample_rate = self.config.target_sample_rate;
        let channels = self.config.target_channels;
        let frame_ms = self.config.buffer_duration_ms.max(1);
        let samples_per_frame =
            (sample_rate as u64 * channels as u64 * frame_ms / 1000).max(1) as usize;

        let (tx, rx) = mpsc::channel(64);
        let capturing = Arc::clone(&self.capturing);
        capturing.store(true, Ordering::SeqCst);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(frame_ms));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut timestamp_ms = 0u64;

            for chunk in samples.chunks(samples_per_frame) {
                interval.tick().await;

                if !capturing.load(Ordering::SeqCst) {
                    break;
                }

                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate,
                    channels,
                    timestamp_ms,
                };
                timestamp_ms += frame_ms;

                if tx.send(frame).await.is_err() {
                    break;
                }
            }

            capturing.store(false, Ordering::SeqCst);
            // tx drops here, closing the stream channel
        });

        self.task = Some(task);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);

        if let Some(task) = self.task.take() {
            task.abort();
            task.await.ok();
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "file"
    }
}
