//! Short-lived cache of transcription records.
//!
//! Strictly best-effort: the orchestrator warms it after persistence and
//! the read path falls back to the record store, so a broken cache only
//! costs latency. Last-writer-wins.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;

use crate::records::TranscriptionRecord;

pub fn record_key(id: &str) -> String {
    format!("transcription:{id}")
}

#[async_trait::async_trait]
pub trait ResultCache: Send + Sync {
    async fn put(&self, key: &str, record: &TranscriptionRecord, ttl: Duration) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<TranscriptionRecord>>;
}

/// In-process cache with lazy expiry on read.
pub struct MemoryResultCache {
    entries: Mutex<HashMap<String, (Instant, TranscriptionRecord)>>,
}

impl MemoryResultCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ResultCache for MemoryResultCache {
    async fn put(&self, key: &str, record: &TranscriptionRecord, ttl: Duration) -> Result<()> {
        let expires_at = Instant::now() + ttl;
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), (expires_at, record.clone()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<TranscriptionRecord>> {
        let mut entries = self.entries.lock().unwrap();

        match entries.get(key) {
            Some((expires_at, _)) if *expires_at <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((_, record)) => Ok(Some(record.clone())),
            None => Ok(None),
        }
    }
}
