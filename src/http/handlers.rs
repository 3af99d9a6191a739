use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, warn};

use super::state::AppState;
use crate::cache::{record_key, ResultCache};
use crate::error::SubmitError;
use crate::orchestrator::{RecordSummary, TranscriptionRequest};
use crate::records::RecordStore;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub data: RecordSummary,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// The identity layer in front of this service puts the authenticated
/// owner in `x-owner-id`; absence is a precondition failure.
fn owner_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-owner-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /transcriptions
/// Submit an audio payload for transcription
pub async fn submit_transcription(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let Some(owner_id) = owner_id(&headers) else {
        return error_response(StatusCode::UNAUTHORIZED, "missing owner identity");
    };

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut folder_id = None;
    let mut title = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("malformed multipart body: {e}"),
                );
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .unwrap_or("recording.wav")
                    .to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => file = Some((file_name, mime_type, bytes.to_vec())),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("failed to read audio file: {e}"),
                        );
                    }
                }
            }
            Some("folder_id") => folder_id = field.text().await.ok().filter(|v| !v.is_empty()),
            Some("title") => title = field.text().await.ok().filter(|v| !v.is_empty()),
            _ => {}
        }
    }

    let Some((file_name, mime_type, bytes)) = file else {
        return error_response(StatusCode::BAD_REQUEST, "no audio file provided");
    };

    let request = TranscriptionRequest {
        owner_id,
        bytes,
        file_name,
        mime_type,
        folder_id,
        title,
    };

    match state.orchestrator.submit(request).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(SubmitResponse {
                success: true,
                data: summary,
            }),
        )
            .into_response(),
        Err(e) => submit_error_response(e),
    }
}

fn submit_error_response(err: SubmitError) -> axum::response::Response {
    let status = match &err {
        SubmitError::PayloadInvalid(_) => StatusCode::BAD_REQUEST,
        SubmitError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        SubmitError::Storage(_) | SubmitError::Engine(_) => StatusCode::BAD_GATEWAY,
        SubmitError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("Transcription submission failed: {err:#?}");
    } else {
        warn!("Transcription submission rejected: {err}");
    }

    error_response(status, err.to_string())
}

/// GET /transcriptions/:id
/// Fetch a transcription record, cache-first
pub async fn get_transcription(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Some(owner_id) = owner_id(&headers) else {
        return error_response(StatusCode::UNAUTHORIZED, "missing owner identity");
    };

    match state.cache.get(&record_key(&id)).await {
        Ok(Some(record)) if record.owner_id == owner_id => {
            return (StatusCode::OK, Json(record)).into_response();
        }
        Ok(_) => {}
        Err(e) => warn!("Cache read failed for {id}: {e:#}"),
    }

    match state.records.get(&owner_id, &id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("transcription {id} not found"),
        ),
        Err(e) => {
            error!("Failed to load transcription {id}: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to load transcription",
            )
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
