use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;

use voicenotes::{
    create_router, ApiClient, AppState, AudioBackendConfig, AudioBackendFactory, AudioSource,
    CaptureConfig, CaptureController, Config, ConsoleWaveform, WaveformMonitor,
};

#[derive(Parser)]
#[command(name = "voicenotes", about = "Speech-to-text note service")]
struct Cli {
    /// Configuration file (without extension), overridable via VOICENOTES__* env vars
    #[arg(long, default_value = "config/voicenotes")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the transcription service (default)
    Serve,

    /// Capture audio from a WAV file and submit it for transcription
    Record {
        /// WAV file replayed as the capture stream
        #[arg(long)]
        input: PathBuf,

        /// Service to submit to
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        server: String,

        /// Owner identity forwarded to the service
        #[arg(long)]
        owner: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        folder: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg).await,
        Command::Record {
            input,
            server,
            owner,
            title,
            folder,
        } => record(cfg, input, server, owner, title, folder).await,
    }
}

async fn serve(cfg: Config) -> Result<()> {
    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Transcription engine at {}", cfg.engine.base_url);
    info!("Artifact root: {}", cfg.storage.root);

    let bind = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(cfg)?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!("HTTP server listening on {bind}");

    axum::serve(listener, router).await?;

    Ok(())
}

async fn record(
    cfg: Config,
    input: PathBuf,
    server: String,
    owner: String,
    title: Option<String>,
    folder: Option<String>,
) -> Result<()> {
    let backend_config = AudioBackendConfig {
        target_sample_rate: cfg.capture.sample_rate,
        target_channels: cfg.capture.channels,
        ..AudioBackendConfig::default()
    };
    let backend = AudioBackendFactory::create(AudioSource::File(input), backend_config.clone())?;

    let capture_config = CaptureConfig {
        chunk_interval: Duration::from_secs(cfg.capture.chunk_interval_secs),
        max_duration_secs: cfg.capture.max_duration_secs,
        auto_save: true,
    };

    let (finalized_tx, mut finalized_rx) = mpsc::channel(1);
    let controller = CaptureController::with_finalized_sink(
        backend,
        backend_config,
        capture_config,
        Some(finalized_tx),
    );

    controller.start().await?;
    let monitor = WaveformMonitor::new(controller.feed(), Arc::new(ConsoleWaveform));
    let monitor_task = monitor.spawn();

    // The file backend stops the session when the stream ends; auto-save
    // then hands the finalized buffer over.
    let finalized = finalized_rx
        .recv()
        .await
        .context("Capture ended without finalized audio")?;
    monitor_task.await.ok();
    println!();

    info!(
        "Captured {}s ({} bytes), submitting to {server}",
        finalized.duration_secs,
        finalized.wav_bytes.len()
    );

    let client = ApiClient::new(server)?;
    let summary = client
        .submit_finalized(&owner, &finalized, title.as_deref(), folder.as_deref())
        .await?;

    info!(
        "Transcribed as {} ({}): {}",
        summary.id, summary.language, summary.text
    );
    info!("Audio stored at {}", summary.audio_url);

    Ok(())
}
