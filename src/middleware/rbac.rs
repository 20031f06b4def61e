// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::Identity,
};

/// Guardião das rotas de supervisor. Só passa quem tem o papel.
#[derive(Debug, Clone)]
pub struct RequireSupervisor(pub AuthenticatedUser);

impl RequireSupervisor {
    pub fn identity(&self) -> Identity {
        self.0.identity()
    }
}

impl<S> FromRequestParts<S> for RequireSupervisor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai o usuário que o auth_guard deixou na requisição
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        // B. Confere o papel
        user.identity().require_supervisor()?;

        Ok(RequireSupervisor(user))
    }
}
