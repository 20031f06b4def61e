// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::{clock::Clock, error::AppError},
    db::{Database, UserRepository},
    models::auth::{Claims, User},
};

const TOKEN_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService<D: Database> {
    db: D,
    jwt_secret: String,
    bcrypt_cost: u32,
    clock: Arc<dyn Clock>,
}

impl<D: Database> AuthService<D> {
    pub fn new(db: D, jwt_secret: String, bcrypt_cost: u32, clock: Arc<dyn Clock>) -> Self {
        Self { db, jwt_secret, bcrypt_cost, clock }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let mut tx = self.db.begin().await?;
        let user = tx
            .find_user_by_email(&normalize_email(email))
            .await?
            .filter(|u| u.active)
            .ok_or(AppError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("🔑 Login de {}", user.email);
        self.create_token(&user)
    }

    pub async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, AppError> {
        let password_clone = password.to_owned();
        let password_hash_clone = password_hash.to_owned();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
        Ok(is_password_valid)
    }

    /// Decodifica o token e recarrega o usuário. Inativo conta como inválido.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let mut tx = self.db.begin().await?;
        tx.find_user(token_data.claims.sub)
            .await?
            .filter(|u| u.active)
            .ok_or(AppError::InvalidToken)
    }

    pub async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let cost = self.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = self.clock.now();
        let expires_at = now + chrono::Duration::days(TOKEN_DAYS);

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
