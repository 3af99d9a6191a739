use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::controller::CaptureFeed;

/// Render target for the live amplitude visualization.
pub trait WaveformSink: Send + Sync {
    fn render(&self, levels: &[f32]);
}

/// Amplitude visualization loop for an active capture.
///
/// Runs at a fixed refresh cadence and re-checks capture state on every
/// iteration: paused capture suspends rendering, a stopped or reset
/// capture terminates the loop. Purely cosmetic; it never blocks the
/// capture tasks.
pub struct WaveformMonitor {
    feed: CaptureFeed,
    sink: Arc<dyn WaveformSink>,
    refresh: Duration,
}

impl WaveformMonitor {
    pub fn new(feed: CaptureFeed, sink: Arc<dyn WaveformSink>) -> Self {
        Self {
            feed,
            sink,
            refresh: Duration::from_millis(33), // ~30 fps
        }
    }

    pub fn with_refresh(mut self, refresh: Duration) -> Self {
        self.refresh = refresh;
        self
    }

    /// Spawn the render loop. The task exits on its own once capture is no
    /// longer active; spawn it after `start()` has succeeded.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.refresh);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                if !self.feed.is_active() {
                    break;
                }
                if self.feed.is_paused() {
                    continue;
                }

                let levels = self.feed.levels();
                self.sink.render(&levels);
            }
        })
    }
}

/// Terminal bar renderer redrawing in place.
pub struct ConsoleWaveform;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

impl WaveformSink for ConsoleWaveform {
    fn render(&self, levels: &[f32]) {
        let line: String = levels
            .iter()
            .map(|l| {
                let idx = (l.clamp(0.0, 1.0) * (BARS.len() - 1) as f32).round() as usize;
                BARS[idx]
            })
            .collect();

        print!("\r{line}");
        std::io::stdout().flush().ok();
    }
}
