// src/handlers/dashboard.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, rbac::RequireSupervisor},
    models::dashboard::{
        ConsultantStats, DailyReport, DayCall, MonthQuery, MonthlyResults, MyMonthlyCalls, SupervisorDashboard,
    },
};

// GET /api/dashboard/me
pub async fn my_stats(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ConsultantStats>, AppError> {
    let stats = app_state.report_service.consultant_stats(&user.identity()).await?;
    Ok(Json(stats))
}

// GET /api/dashboard/supervisor
pub async fn supervisor_dashboard(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
) -> Result<Json<SupervisorDashboard>, AppError> {
    let dashboard = app_state
        .report_service
        .supervisor_dashboard(&supervisor.identity())
        .await?;
    Ok(Json(dashboard))
}

// GET /api/dashboard/monthly?month=&year=
pub async fn monthly_results(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlyResults>, AppError> {
    let results = app_state
        .report_service
        .monthly_results(&supervisor.identity(), query.month, query.year)
        .await?;
    Ok(Json(results))
}

// GET /api/dashboard/my-monthly?month=&year=
pub async fn my_monthly_calls(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MyMonthlyCalls>, AppError> {
    let calls = app_state
        .report_service
        .my_monthly_calls(&user.identity(), query.month, query.year)
        .await?;
    Ok(Json(calls))
}

// GET /api/reports/daily
pub async fn daily_report(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
) -> Result<Json<DailyReport>, AppError> {
    let report = app_state.report_service.daily_report(&supervisor.identity()).await?;
    Ok(Json(report))
}

// GET /api/reports/day/{date}
pub async fn calls_of_day(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
    Path(date): Path<String>,
) -> Result<Json<Vec<DayCall>>, AppError> {
    let calls = app_state
        .report_service
        .calls_of_day(&supervisor.identity(), &date)
        .await?;
    Ok(Json(calls))
}
