// src/handlers/calls.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::call::{Call, CallHistoryEntry, CallInput, EditNotePayload},
};

// POST /api/clients/{id}/calls
pub async fn log_call(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(client_id): Path<Uuid>,
    Json(input): Json<CallInput>,
) -> Result<impl IntoResponse, AppError> {
    let call = app_state
        .call_service
        .log_call(&user.identity(), client_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(call)))
}

// GET /api/clients/{id}/calls
pub async fn call_history(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<CallHistoryEntry>>, AppError> {
    let history = app_state.call_service.history_for(&user.identity(), client_id).await?;
    Ok(Json(history))
}

// PUT /api/calls/{id}/note
pub async fn edit_note(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(call_id): Path<Uuid>,
    Json(payload): Json<EditNotePayload>,
) -> Result<Json<Call>, AppError> {
    let call = app_state
        .call_service
        .edit_note(&user.identity(), call_id, payload.note.as_deref())
        .await?;
    Ok(Json(call))
}
