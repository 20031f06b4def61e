// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::RequireSupervisor,
    models::auth::{CreateUserPayload, DailyGoalPayload, ResetPasswordPayload, UpdateUserPayload, User},
};

// GET /api/users
pub async fn list_users(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
) -> Result<Json<Vec<User>>, AppError> {
    let users = app_state.user_service.list(&supervisor.identity()).await?;
    Ok(Json(users))
}

// POST /api/users
pub async fn create_user(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state.user_service.create(&supervisor.identity(), payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// POST /api/users/{id}/toggle-status
pub async fn toggle_status(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .user_service
        .toggle_status(&supervisor.identity(), user_id)
        .await?;
    Ok(Json(user))
}

// PUT /api/users/{id}/daily-goal
pub async fn set_daily_goal(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<DailyGoalPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;

    let user = app_state
        .user_service
        .set_daily_goal(&supervisor.identity(), user_id, payload.daily_goal)
        .await?;
    Ok(Json(user))
}

// PUT /api/users/{id}
pub async fn update_user(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;

    let user = app_state
        .user_service
        .update_user(&supervisor.identity(), user_id, payload)
        .await?;
    Ok(Json(user))
}

// POST /api/users/{id}/reset-password
pub async fn reset_password(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    app_state
        .user_service
        .reset_password(&supervisor.identity(), user_id, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
