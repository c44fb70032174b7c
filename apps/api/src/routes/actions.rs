//! Guarded action handlers: upload, analyze, edit, download.
//!
//! Every handler runs the same guard chain before doing work: resolve the
//! principal from `X-Session-Id`, validate session security, record
//! activity, then consume one rate-limit slot for the endpoint. The work
//! itself runs through the retry engine with the endpoint's operation-class
//! policy.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::AnalysisReport;
use crate::errors::AppError;
use crate::guard::rate_limit::Endpoint;
use crate::guard::retry::retry_operation;
use crate::guard::sanitize::{safe_filename, validate_upload};
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";

/// Runs the guard chain and returns the authorized principal (session id).
async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    endpoint: Endpoint,
) -> Result<String, AppError> {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let report = state.sessions.validate_session_security(session_id);
    if !report.is_valid {
        return Err(AppError::SessionInvalid {
            warnings: report.warnings,
        });
    }
    state.sessions.update_activity(session_id).await?;

    let decision = state.limiter.check_endpoint(session_id, endpoint);
    if !decision.allowed {
        return Err(AppError::RateLimited {
            retry_after: decision.retry_after.unwrap_or_default(),
        });
    }

    Ok(session_id.to_string())
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub key: String,
    pub size: usize,
}

/// POST /api/v1/uploads — multipart CV upload, stored to S3.
pub async fn handle_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let session_id = authorize(&state, &headers, Endpoint::Upload).await?;

    let mut filename: Option<String> = None;
    let mut data: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(str::to_string);
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?,
            );
        }
    }

    let filename = filename.ok_or_else(|| AppError::Validation("A filename is required".to_string()))?;
    let data = data.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    validate_upload(&filename, data.len())?;

    let key = format!(
        "uploads/{}/{}-{}",
        session_id,
        Uuid::new_v4(),
        safe_filename(&filename)
    );

    let s3 = state.s3.clone();
    let bucket = state.config.s3_bucket.clone();
    let object_key = key.clone();
    let body = data.clone();
    retry_operation("upload", &state.retry.upload, move || {
        let s3 = s3.clone();
        let bucket = bucket.clone();
        let object_key = object_key.clone();
        let body = body.clone();
        async move {
            let _ = s3
                .put_object()
                .bucket(&bucket)
                .key(&object_key)
                .body(ByteStream::from(body.to_vec()))
                .content_type("application/octet-stream")
                .send()
                .await
                .map_err(|e| AppError::S3(format!("Upload failed: {e}")))?;
            Ok(())
        }
    })
    .await?;

    Ok(Json(UploadResponse {
        key,
        size: data.len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub document: String,
}

/// POST /api/v1/analyze — AI review of a CV document.
pub async fn handle_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    let _ = authorize(&state, &headers, Endpoint::Analyze).await?;

    if req.document.trim().is_empty() {
        return Err(AppError::Validation("Document must not be empty".to_string()));
    }

    let backend = state.analysis.clone();
    let document = req.document.clone();
    let report = retry_operation("analysis", &state.retry.analysis, move || {
        let backend = backend.clone();
        let document = document.clone();
        async move { backend.analyze(&document).await }
    })
    .await?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub document: String,
    pub instruction: String,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub document: String,
}

/// POST /api/v1/edits — chat-driven edit of a CV document.
pub async fn handle_edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EditRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let _ = authorize(&state, &headers, Endpoint::Edit).await?;

    if req.document.trim().is_empty() || req.instruction.trim().is_empty() {
        return Err(AppError::Validation(
            "Document and instruction must not be empty".to_string(),
        ));
    }

    let backend = state.analysis.clone();
    let document = req.document.clone();
    let instruction = req.instruction.clone();
    let revised = retry_operation("edit", &state.retry.edit, move || {
        let backend = backend.clone();
        let document = document.clone();
        let instruction = instruction.clone();
        async move { backend.apply_edit(&document, &instruction).await }
    })
    .await?;

    Ok(Json(EditResponse { document: revised }))
}

/// GET /api/v1/downloads/*key — fetch a stored document.
pub async fn handle_download(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let _ = authorize(&state, &headers, Endpoint::Download).await?;

    // Only keys minted by the upload handler are reachable.
    if !key.starts_with("uploads/") || key.contains("..") {
        return Err(AppError::Validation("Invalid download key".to_string()));
    }

    let s3 = state.s3.clone();
    let bucket = state.config.s3_bucket.clone();
    let object_key = key.clone();
    let bytes = retry_operation("download", &state.retry.download, move || {
        let s3 = s3.clone();
        let bucket = bucket.clone();
        let object_key = object_key.clone();
        async move {
            let object = s3
                .get_object()
                .bucket(&bucket)
                .key(&object_key)
                .send()
                .await
                .map_err(|e| AppError::S3(format!("Download failed: {e}")))?;
            let collected = object
                .body
                .collect()
                .await
                .map_err(|e| AppError::S3(format!("Download stream failed: {e}")))?;
            Ok(collected.into_bytes())
        }
    })
    .await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}
