// src/services/user_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::{Database, UnitOfWork, UserRepository},
    models::auth::{ChangePasswordPayload, CreateUserPayload, Identity, NewUser, Role, UpdateUserPayload, User},
    services::auth::{normalize_email, AuthService},
};

pub const DEFAULT_DAILY_GOAL: i32 = 10;
const MIN_PASSWORD_LEN: usize = 6;

/// Gestão de usuários (supervisor).
#[derive(Clone)]
pub struct UserService<D: Database> {
    db: D,
    clock: Arc<dyn Clock>,
    auth: AuthService<D>,
}

impl<D: Database> UserService<D> {
    pub fn new(db: D, clock: Arc<dyn Clock>, auth: AuthService<D>) -> Self {
        Self { db, clock, auth }
    }

    pub async fn me(&self, identity: &Identity) -> Result<User, AppError> {
        let mut tx = self.db.begin().await?;
        tx.find_user(identity.user_id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))
    }

    pub async fn create(&self, identity: &Identity, payload: CreateUserPayload) -> Result<User, AppError> {
        identity.require_supervisor()?;
        self.insert(
            payload.name.trim(),
            &payload.email,
            &payload.password,
            payload.role.unwrap_or(Role::Consultant),
            payload.daily_goal.unwrap_or(DEFAULT_DAILY_GOAL),
        )
        .await
    }

    async fn insert(&self, name: &str, email: &str, password: &str, role: Role, daily_goal: i32) -> Result<User, AppError> {
        let password_hash = self.auth.hash_password(password).await?;

        let mut tx = self.db.begin().await?;
        let user = tx
            .insert_user(NewUser {
                name: name.to_string(),
                email: normalize_email(email),
                password_hash,
                role,
                daily_goal,
                created_at: self.clock.now(),
            })
            .await?;
        tx.commit().await?;

        tracing::info!("👤 Usuário {} criado ({:?})", user.email, user.role);
        Ok(user)
    }

    pub async fn list(&self, identity: &Identity) -> Result<Vec<User>, AppError> {
        identity.require_supervisor()?;
        let mut tx = self.db.begin().await?;
        tx.list_users().await
    }

    /// Ativa/inativa. Ninguém inativa a própria conta.
    pub async fn toggle_status(&self, identity: &Identity, user_id: Uuid) -> Result<User, AppError> {
        identity.require_supervisor()?;
        if identity.user_id == user_id {
            return Err(AppError::forbidden("Você não pode inativar sua própria conta."));
        }

        let mut tx = self.db.begin().await?;
        let mut user = tx.find_user(user_id).await?.ok_or(AppError::NotFound("Usuário"))?;
        user.active = !user.active;
        tx.set_user_active(user.id, user.active).await?;
        tx.commit().await?;

        Ok(user)
    }

    pub async fn set_daily_goal(&self, identity: &Identity, user_id: Uuid, goal: i32) -> Result<User, AppError> {
        identity.require_supervisor()?;

        let mut tx = self.db.begin().await?;
        let mut user = tx.find_user(user_id).await?.ok_or(AppError::NotFound("Usuário"))?;
        user.daily_goal = goal.max(0);
        tx.set_daily_goal(user.id, user.daily_goal).await?;
        tx.commit().await?;

        Ok(user)
    }

    /// Edição completa pelo supervisor. Meta ausente volta ao padrão.
    pub async fn update_user(&self, identity: &Identity, user_id: Uuid, payload: UpdateUserPayload) -> Result<User, AppError> {
        identity.require_supervisor()?;

        let mut tx = self.db.begin().await?;
        let mut user = tx.find_user(user_id).await?.ok_or(AppError::NotFound("Usuário"))?;
        user.name = payload.name.trim().to_string();
        user.email = normalize_email(&payload.email);
        user.role = payload.role;
        user.daily_goal = payload.daily_goal.unwrap_or(DEFAULT_DAILY_GOAL).max(0);
        tx.update_user(&user).await?;
        tx.commit().await?;

        tracing::info!("✏️ Usuário {} atualizado", user.email);
        Ok(user)
    }

    /// Supervisor define uma senha nova sem conhecer a anterior.
    pub async fn reset_password(&self, identity: &Identity, user_id: Uuid, new_password: &str) -> Result<(), AppError> {
        identity.require_supervisor()?;
        check_password_length(new_password)?;

        let password_hash = self.auth.hash_password(new_password).await?;

        let mut tx = self.db.begin().await?;
        let user = tx.find_user(user_id).await?.ok_or(AppError::NotFound("Usuário"))?;
        tx.set_password(user.id, &password_hash).await?;
        tx.commit().await?;

        tracing::info!("🔐 Senha de {} redefinida", user.email);
        Ok(())
    }

    /// Troca da própria senha: exige a atual e a confirmação.
    pub async fn change_password(&self, identity: &Identity, payload: ChangePasswordPayload) -> Result<(), AppError> {
        if payload.current_password.is_empty() {
            return Err(AppError::required("current_password", "A senha atual é obrigatória."));
        }
        if payload.new_password != payload.confirm_password {
            return Err(AppError::required("confirm_password", "As senhas não conferem."));
        }
        check_password_length(&payload.new_password)?;

        let user = self.me(identity).await?;
        if !self.auth.verify_password(&payload.current_password, &user.password_hash).await? {
            return Err(AppError::required("current_password", "Senha atual incorreta."));
        }

        let password_hash = self.auth.hash_password(&payload.new_password).await?;
        let mut tx = self.db.begin().await?;
        tx.set_password(user.id, &password_hash).await?;
        tx.commit().await?;

        tracing::info!("🔐 {} trocou a própria senha", user.email);
        Ok(())
    }

    /// Cria o primeiro supervisor quando o banco ainda não tem usuários.
    pub async fn ensure_supervisor(&self, name: &str, email: &str, password: &str) -> Result<Option<User>, AppError> {
        let mut tx = self.db.begin().await?;
        if tx.count_users().await? > 0 {
            return Ok(None);
        }
        drop(tx);

        let user = self.insert(name, email, password, Role::Supervisor, 0).await?;
        Ok(Some(user))
    }
}

fn check_password_length(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::required("new_password", "A senha deve ter no mínimo 6 caracteres."));
    }
    Ok(())
}
