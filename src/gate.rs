//! Per-owner admission control for the transcription endpoint.
//!
//! Fixed-window counting over a pluggable counter store; production
//! deployments back the store with something shared across instances so
//! the window holds for an owner no matter which server admits them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;
use tracing::warn;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed { remaining: u32 },
    /// Retryable: the caller should back off for at least `retry_after`.
    Denied { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

/// Windowed counter backing the gate, keyed `"<operation>:<owner>"`.
#[async_trait::async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment the counter for `key` within the current fixed window.
    /// Returns the count after the increment and the time left in the
    /// window. Must be safe under concurrent increments of one key.
    async fn increment(&self, key: &str, window: Duration) -> Result<(u32, Duration)>;
}

/// In-process counter store.
pub struct MemoryCounterStore {
    slots: Mutex<HashMap<String, (Instant, u32)>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<(u32, Duration)> {
        let now = Instant::now();
        let mut slots = self.slots.lock().unwrap();

        let slot = slots.entry(key.to_string()).or_insert((now, 0));
        if now.duration_since(slot.0) >= window {
            *slot = (now, 0);
        }

        slot.1 += 1;
        let remaining = window.saturating_sub(now.duration_since(slot.0));
        Ok((slot.1, remaining))
    }
}

/// Admission gate: at most `max_requests` per owner per window.
pub struct UploadGate {
    store: std::sync::Arc<dyn CounterStore>,
    operation: String,
    window: Duration,
    max_requests: u32,
}

impl UploadGate {
    pub fn new(
        store: std::sync::Arc<dyn CounterStore>,
        operation: impl Into<String>,
        window: Duration,
        max_requests: u32,
    ) -> Self {
        Self {
            store,
            operation: operation.into(),
            window,
            max_requests,
        }
    }

    pub async fn admit(&self, owner_id: &str) -> Admission {
        let key = format!("{}:{}", self.operation, owner_id);

        match self.store.increment(&key, self.window).await {
            Ok((count, _)) if count <= self.max_requests => Admission::Allowed {
                remaining: self.max_requests - count,
            },
            Ok((_, window_remaining)) => Admission::Denied {
                retry_after: window_remaining,
            },
            Err(e) => {
                // Admission is a throttle, not an authz boundary: a dead
                // counter store admits rather than taking the endpoint down.
                warn!("Rate limit store unavailable, admitting {key}: {e:#}");
                Admission::Allowed { remaining: 0 }
            }
        }
    }
}
