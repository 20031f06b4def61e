// src/db/user_repo.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        pg::{unique_or, PgStore},
        repository::UserRepository,
    },
    models::auth::{NewUser, User},
};

// Responsável por todas as interações com a tabela 'users'
impl UserRepository for PgStore {
    // Busca um usuário pelo seu ID
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, role, active, daily_goal, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.conn())
        .await?;

        Ok(user)
    }

    // Busca um usuário pelo seu e-mail
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, role, active, daily_goal, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.conn())
        .await?;

        Ok(user)
    }

    // Cria um novo usuário no banco de dados
    async fn insert_user(&mut self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role, daily_goal, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, password_hash, role, active, daily_goal, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.daily_goal)
        .bind(user.created_at)
        .fetch_one(self.conn())
        .await
        // Converte erro de violação de chave única em um erro mais amigável
        .map_err(|e| unique_or(e, || AppError::EmailAlreadyExists))
    }

    async fn list_users(&mut self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, active, daily_goal, created_at
            FROM users
            ORDER BY role DESC, name ASC
            "#,
        )
        .fetch_all(self.conn())
        .await?;

        Ok(users)
    }

    async fn count_users(&mut self) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.conn())
            .await?;

        Ok(total)
    }

    async fn set_user_active(&mut self, id: Uuid, active: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(self.conn())
            .await?;

        Ok(())
    }

    async fn set_daily_goal(&mut self, id: Uuid, goal: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET daily_goal = $2 WHERE id = $1")
            .bind(id)
            .bind(goal)
            .execute(self.conn())
            .await?;

        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET name = $2, email = $3, role = $4, daily_goal = $5 WHERE id = $1")
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.role)
            .bind(user.daily_goal)
            .execute(self.conn())
            .await
            .map_err(|e| unique_or(e, || AppError::EmailAlreadyExists))?;

        Ok(())
    }

    async fn set_password(&mut self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(self.conn())
            .await?;

        Ok(())
    }
}
