// src/handlers/notes.rs

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
    models::note::{AddNotePayload, NoteView},
};

// GET /api/clients/{id}/notes
pub async fn list_notes(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<NoteView>>, AppError> {
    let notes = app_state.note_service.list(&user.identity(), client_id).await?;
    Ok(Json(notes))
}

// POST /api/clients/{id}/notes
pub async fn add_note(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<AddNotePayload>,
) -> Result<impl IntoResponse, AppError> {
    let note = app_state
        .note_service
        .add(&user.identity(), client_id, &payload.body)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}
