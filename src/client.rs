//! Upload client: submits finalized audio to the transcription service.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart;
use serde::Deserialize;

use crate::capture::FinalizedAudio;
use crate::orchestrator::RecordSummary;

#[derive(Debug, Deserialize)]
struct SubmitEnvelope {
    data: RecordSummary,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Upload an audio payload for transcription.
    pub async fn submit(
        &self,
        owner_id: &str,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
        title: Option<&str>,
        folder_id: Option<&str>,
    ) -> Result<RecordSummary> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .context("Invalid MIME type")?;

        let mut form = multipart::Form::new().part("file", part);
        if let Some(title) = title {
            form = form.text("title", title.to_string());
        }
        if let Some(folder_id) = folder_id {
            form = form.text("folder_id", folder_id.to_string());
        }

        let response = self
            .http
            .post(format!("{}/transcriptions", self.base_url))
            .header("x-owner-id", owner_id)
            .multipart(form)
            .send()
            .await
            .context("Failed to reach transcription service")?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            anyhow::bail!("rate limited, try again later");
        }
        if !status.is_success() {
            let detail = response
                .json::<ErrorEnvelope>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| status.to_string());
            anyhow::bail!("submission failed: {detail}");
        }

        let envelope: SubmitEnvelope = response
            .json()
            .await
            .context("Malformed submission response")?;

        Ok(envelope.data)
    }

    /// Convenience wrapper for a finalized capture.
    pub async fn submit_finalized(
        &self,
        owner_id: &str,
        finalized: &FinalizedAudio,
        title: Option<&str>,
        folder_id: Option<&str>,
    ) -> Result<RecordSummary> {
        self.submit(
            owner_id,
            &finalized.file_name(),
            finalized.mime_type,
            finalized.wav_bytes.clone(),
            title,
            folder_id,
        )
        .await
    }
}
