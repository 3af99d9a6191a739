use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub engine: EngineConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub capture: CaptureSettings,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the remote transcription engine
    pub base_url: String,
    /// Bound on a single engine call, including the upload
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory raw audio artifacts are written under
    pub root: String,
    /// URL prefix artifact keys resolve beneath
    pub public_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted audio payload in bytes
    pub max_bytes: u64,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureSettings {
    pub sample_rate: u32,
    pub channels: u16,
    /// Cadence of chunk collection while recording
    pub chunk_interval_secs: u64,
    /// Recording length that triggers auto-stop
    pub max_duration_secs: u64,
    /// Submit finalized audio as soon as capture stops
    pub auto_save: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Config {
    /// Load configuration from an optional file, with defaults and
    /// `VOICENOTES__`-prefixed environment overrides layered on top.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "voicenotes")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 8080_i64)?
            .set_default("engine.base_url", "http://localhost:8000")?
            .set_default("engine.timeout_secs", 120_i64)?
            .set_default("storage.root", "data/artifacts")?
            .set_default("storage.public_base", "/artifacts")?
            .set_default("upload.max_bytes", 26_214_400_i64)? // 25 MiB
            .set_default("upload.rate_limit.window_ms", 60_000_i64)?
            .set_default("upload.rate_limit.max_requests", 10_i64)?
            .set_default("capture.sample_rate", 16_000_i64)?
            .set_default("capture.channels", 1_i64)?
            .set_default("capture.chunk_interval_secs", 1_i64)?
            .set_default("capture.max_duration_secs", 600_i64)?
            .set_default("capture.auto_save", true)?
            .set_default("cache.ttl_secs", 3600_i64)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VOICENOTES").separator("__"))
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.http.port == 0 {
            anyhow::bail!("service.http.port must be non-zero");
        }
        if self.upload.max_bytes == 0 {
            anyhow::bail!("upload.max_bytes must be non-zero");
        }
        if self.upload.rate_limit.window_ms == 0 || self.upload.rate_limit.max_requests == 0 {
            anyhow::bail!("upload.rate_limit window and max_requests must be non-zero");
        }
        if self.engine.timeout_secs == 0 {
            anyhow::bail!("engine.timeout_secs must be non-zero");
        }
        if self.capture.sample_rate == 0 || self.capture.channels == 0 {
            anyhow::bail!("capture.sample_rate and capture.channels must be non-zero");
        }
        Ok(())
    }
}
