use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::session::{SecurityReport, SessionRecord};
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<Json<SessionRecord>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let record = state.sessions.create_session(req.metadata).await?;
    Ok(Json(record))
}

/// GET /api/v1/sessions/current
pub async fn handle_current_session(
    State(state): State<AppState>,
) -> Result<Json<SessionRecord>, AppError> {
    state
        .sessions
        .get_current_session()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No active session".to_string()))
}

/// POST /api/v1/sessions/:id/activity
pub async fn handle_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.sessions.update_activity(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/sessions/:id/security
pub async fn handle_security(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SecurityReport>, AppError> {
    Ok(Json(state.sessions.validate_session_security(&id)))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_invalidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.sessions.invalidate_session(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
