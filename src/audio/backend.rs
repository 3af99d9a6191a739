use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Acquisition parameters for the hardware stream.
///
/// The processing switches mirror what a browser capture stack applies at
/// the source; backends that cannot honor them treat them as hints.
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Target sample rate (will resample if needed)
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain: bool,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // 16kHz for speech models
            target_channels: 1,        // Mono
            buffer_duration_ms: 100,   // 100ms buffers
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain: true,
        }
    }
}

/// Audio capture backend trait
///
/// The hardware stream lives behind this seam; the capture controller only
/// ever sees the frame channel.
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio.
    ///
    /// Returns a channel receiver that will receive audio frames. The
    /// sender side must be dropped by `stop()` so the channel closes when
    /// the stream is released.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio and release the stream. Idempotent.
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio source type
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Microphone input (requires a platform backend)
    Microphone,
    /// WAV file replayed as a live stream (testing/batch submission)
    File(PathBuf),
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    pub fn create(source: AudioSource, config: AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        match source {
            AudioSource::Microphone => {
                anyhow::bail!("microphone capture requires a platform audio backend")
            }
            AudioSource::File(path) => Ok(Box::new(super::file::FileBackend::new(path, config))),
        }
    }
}

/// Downsample by decimation. Upsampling is not supported; the input is
/// returned unchanged when the target rate is not lower.
pub fn downsample(samples: &[i16], source_rate: u32, target_rate: u32) -> Vec<i16> {
    if source_rate <= target_rate || target_rate == 0 {
        return samples.to_vec();
    }

    let ratio = source_rate / target_rate;
    if ratio <= 1 {
        return samples.to_vec();
    }

    samples.iter().step_by(ratio as usize).copied().collect()
}

/// Convert interleaved stereo to mono by summing channels.
pub fn stereo_to_mono(samples: &[i16]) -> Vec<i16> {
    let mut mono = Vec::with_capacity(samples.len() / 2);

    // Sum left and right (no division to preserve volume)
    for pair in samples.chunks_exact(2) {
        let sum = pair[0] as i32 + pair[1] as i32;
        mono.push(sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
    }

    mono
}
