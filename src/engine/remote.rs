use std::time::Duration;

use reqwest::multipart;
use serde::Deserialize;
use tracing::debug;

use super::{EngineError, Transcriber, Transcript};

#[derive(Debug, Deserialize)]
struct EngineResponse {
    text: String,
    language: String,
}

/// Client for a remote transcription engine speaking the
/// `POST /transcribe/` multipart contract.
pub struct HttpTranscriber {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTranscriber {
    /// `timeout` bounds the whole call, upload included; an elapsed
    /// timeout surfaces as `EngineError::Request`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(
        &self,
        audio: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<Transcript, EngineError> {
        let part = multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = multipart::Form::new().part("file", part);

        debug!(
            "Submitting {} bytes ({mime_type}) to engine at {}",
            audio.len(),
            self.base_url
        );

        let response = self
            .http
            .post(format!("{}/transcribe/", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EngineError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let body: EngineResponse = response.json().await?;

        Ok(Transcript {
            text: body.text,
            language: body.language,
            segments: Vec::new(),
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
