//! Upload API handlers
//!
//! POST /upload/training and POST /upload/recognition accept multipart form
//! bodies as submitted by the browser capture page. Metadata fields must
//! precede the file part: the payload streams straight from the socket to
//! the dataset file, so validation has to be complete by the time the file
//! part arrives. Payload bytes are never inspected.

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::{routing::post, Json, Router};
use futures::TryStreamExt;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::ingest::{self, DatasetEntry, IngestError, IngestRequest, ModeKind};
use crate::AppState;

/// Largest accepted upload body. Generous for uncompressed capture clips.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Successful upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub message: String,
    pub mode: ModeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub filename: String,
    pub path: String,
    pub size_bytes: u64,
}

impl UploadResponse {
    fn from_entry(request: &IngestRequest, entry: DatasetEntry) -> Self {
        Self {
            status: "success",
            message: "Audio sample saved".to_string(),
            mode: entry.mode,
            speaker: request.mode.speaker().map(str::to_string),
            category: request.mode.category().map(str::to_string),
            filename: entry.filename,
            path: entry.path.display().to_string(),
            size_bytes: entry.size_bytes,
        }
    }
}

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Malformed multipart request: {err}"))
}

fn stream_error(err: MultipartError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err)
}

/// POST /upload/training
///
/// Multipart fields: `speaker`, `category`, then `file`. Mode is fixed by
/// this route; the client cannot relabel a sample as training data any
/// other way.
pub async fn upload_training(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut speaker: Option<String> = None;
    let mut category: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        // Copy the name out so the field itself stays consumable
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("speaker") => speaker = Some(field.text().await.map_err(bad_multipart)?),
            Some("category") => category = Some(field.text().await.map_err(bad_multipart)?),
            Some("file") => {
                let request = ingest::training_request(
                    speaker.as_deref().unwrap_or(""),
                    category.as_deref().unwrap_or(""),
                )?;

                tracing::info!(
                    speaker = request.mode.speaker().unwrap_or(""),
                    category = request.mode.category().unwrap_or(""),
                    "received training upload"
                );

                let payload = Box::pin(field.map_err(stream_error));
                match state.store.ingest(&request, payload, None).await {
                    Ok(entry) => {
                        tracing::info!(
                            filename = %entry.filename,
                            size_bytes = entry.size_bytes,
                            "training sample persisted"
                        );
                        return Ok(Json(UploadResponse::from_entry(&request, entry)));
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "training upload failed");
                        state.record_error(&err).await;
                        return Err(err.into());
                    }
                }
            }
            _ => {}
        }
    }

    Err(IngestError::MissingField("file").into())
}

/// POST /upload/recognition
///
/// Multipart field: `file`. The part's client filename, when present, is
/// kept (sanitized) for traceability only; recognition samples are never
/// attributed to a speaker.
pub async fn upload_recognition(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        if name.as_deref() == Some("file") {
            let original_name = field.file_name().map(str::to_string);
            let request = ingest::recognition_request(original_name.as_deref());

            tracing::info!(
                original_name = original_name.as_deref().unwrap_or(""),
                "received recognition upload"
            );

            let payload = Box::pin(field.map_err(stream_error));
            match state.store.ingest(&request, payload, None).await {
                Ok(entry) => {
                    tracing::info!(
                        filename = %entry.filename,
                        size_bytes = entry.size_bytes,
                        "recognition sample persisted"
                    );
                    return Ok(Json(UploadResponse::from_entry(&request, entry)));
                }
                Err(err) => {
                    tracing::error!(error = %err, "recognition upload failed");
                    state.record_error(&err).await;
                    return Err(err.into());
                }
            }
        }
    }

    Err(IngestError::MissingField("file").into())
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload/training", post(upload_training))
        .route("/upload/recognition", post(upload_recognition))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
