//! Durable transcription records and the persistence seam.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// A persisted transcription.
///
/// `original_text` and `audio_url` are immutable once created; favorite,
/// title and folder edits belong to the CRUD layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionRecord {
    pub id: String,
    pub owner_id: String,
    pub folder_id: Option<String>,
    pub title: String,
    pub original_text: String,
    pub audio_url: String,
    pub language: String,
    pub is_favorite: bool,
    /// Free-form upload metadata: artifact key, original file name, size,
    /// MIME type, transcription timestamp
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Fields of a record about to be created.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub id: String,
    pub owner_id: String,
    pub folder_id: Option<String>,
    pub title: String,
    pub original_text: String,
    pub audio_url: String,
    pub language: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum PersistError {
    /// Uniqueness violation, distinct from backend faults so the CRUD
    /// layer can reuse this primitive
    #[error("record {0} already exists")]
    Duplicate(String),

    #[error("persistence backend error: {0}")]
    Backend(String),
}

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a record exactly once; `Duplicate` if the id is taken.
    async fn create(&self, record: NewRecord) -> Result<TranscriptionRecord, PersistError>;

    async fn get(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Option<TranscriptionRecord>, PersistError>;
}

/// In-process record store.
pub struct MemoryRecordStore {
    rows: RwLock<HashMap<String, TranscriptionRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, record: NewRecord) -> Result<TranscriptionRecord, PersistError> {
        let mut rows = self.rows.write().await;

        if rows.contains_key(&record.id) {
            return Err(PersistError::Duplicate(record.id));
        }

        let stored = TranscriptionRecord {
            id: record.id.clone(),
            owner_id: record.owner_id,
            folder_id: record.folder_id,
            title: record.title,
            original_text: record.original_text,
            audio_url: record.audio_url,
            language: record.language,
            is_favorite: false,
            metadata: record.metadata,
            created_at: Utc::now(),
        };

        rows.insert(record.id, stored.clone());
        Ok(stored)
    }

    async fn get(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Option<TranscriptionRecord>, PersistError> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(id)
            .filter(|record| record.owner_id == owner_id)
            .cloned())
    }
}
