// src/handlers/clients.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, rbac::RequireSupervisor},
    models::client::{ClearConsultantPayload, ClientListing, CreateClientPayload, ListClientsQuery, RemoveClientPayload},
};

// GET /api/clients?tab=pending|contacted|needs_follow_up&q=...&window=recent|stale&onlyMine=true
pub async fn list_clients(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListClientsQuery>,
) -> Result<Json<ClientListing>, AppError> {
    let listing = app_state.client_service.list(&user.identity(), &query).await?;
    Ok(Json(listing))
}

// POST /api/clients
pub async fn create_client(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let client = app_state.client_service.create_manual(&user.identity(), payload).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

// POST /api/clients/{id}/remove
pub async fn remove_client(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<RemoveClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    let client = app_state
        .client_service
        .remove(&user.identity(), client_id, payload.reason.as_deref())
        .await?;

    Ok(Json(json!({ "message": format!("Cliente {} removido com sucesso", client.name) })))
}

// POST /api/clients/clear-consultant
pub async fn clear_consultant(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
    Json(payload): Json<ClearConsultantPayload>,
) -> Result<impl IntoResponse, AppError> {
    let removed = app_state
        .client_service
        .deactivate_all_for_consultant(&supervisor.identity(), payload.consultant_id)
        .await?;

    Ok(Json(json!({ "removed": removed })))
}
