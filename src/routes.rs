// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};

use crate::{config::AppState, handlers, middleware::auth::auth_guard};

// Planilhas grandes chegam num único upload
pub const UPLOAD_LIMIT_BYTES: usize = 20 * 1024 * 1024;

/// Monta o router completo da API sobre o estado já inicializado.
pub fn router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/me/password", post(handlers::auth::change_password))
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/{id}", put(handlers::users::update_user))
        .route("/{id}/toggle-status", post(handlers::users::toggle_status))
        .route("/{id}/daily-goal", put(handlers::users::set_daily_goal))
        .route("/{id}/reset-password", post(handlers::users::reset_password));

    let client_routes = Router::new()
        .route(
            "/",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route("/clear-consultant", post(handlers::clients::clear_consultant))
        .route("/{id}/remove", post(handlers::clients::remove_client))
        .route(
            "/{id}/calls",
            post(handlers::calls::log_call).get(handlers::calls::call_history),
        )
        .route(
            "/{id}/notes",
            get(handlers::notes::list_notes).post(handlers::notes::add_note),
        );

    let dashboard_routes = Router::new()
        .route("/me", get(handlers::dashboard::my_stats))
        .route("/supervisor", get(handlers::dashboard::supervisor_dashboard))
        .route("/monthly", get(handlers::dashboard::monthly_results))
        .route("/my-monthly", get(handlers::dashboard::my_monthly_calls));

    // Tudo abaixo exige token válido
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/clients", client_routes)
        .nest("/dashboard", dashboard_routes)
        .route("/calls/{id}/note", put(handlers::calls::edit_note))
        .route(
            "/import",
            post(handlers::import::import_clients).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/reports/daily", get(handlers::dashboard::daily_report))
        .route("/reports/day/{date}", get(handlers::dashboard::calls_of_day))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        .with_state(app_state)
}
