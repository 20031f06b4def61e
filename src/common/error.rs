use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro único: os serviços devolvem AppError e os handlers
// convertem direto em resposta HTTP.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Sem permissão: {0}")]
    PermissionDenied(String),

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("{0}")]
    UniqueConstraintViolation(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Planilha inválida: {0}")]
    InvalidSpreadsheet(String),

    // Falhas de banco vindas do sqlx (transação, commit, constraint...)
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Falhas de persistência que não passam pelo sqlx (backend em memória)
    #[error("Erro de persistência: {0}")]
    Persistence(String),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Erro de validação para um campo obrigatório ausente.
    pub fn required(field: &'static str, message: &str) -> Self {
        let mut errors = validator::ValidationErrors::new();
        let mut error = validator::ValidationError::new("required");
        error.message = Some(message.to_string().into());
        errors.add(field, error);
        AppError::ValidationError(errors)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::PermissionDenied(message.into())
    }

    /// Indica se o erro veio da camada de persistência.
    pub fn is_persistence(&self) -> bool {
        matches!(self, AppError::DatabaseError(_) | AppError::Persistence(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::PermissionDenied(ref msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(entity) => (StatusCode::NOT_FOUND, format!("{} não encontrado.", entity)),
            AppError::UniqueConstraintViolation(ref msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string()),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::InvalidSpreadsheet(ref msg) => (StatusCode::BAD_REQUEST, format!("Planilha inválida: {}", msg)),

            // Todos os outros erros (banco, bcrypt, jwt, interno) viram 500.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_builds_field_level_validation_error() {
        let err = AppError::required("name", "Nome é obrigatório");
        match err {
            AppError::ValidationError(errors) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("name"));
            }
            other => panic!("esperava ValidationError, veio {other:?}"),
        }
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let forbidden = AppError::forbidden("não é seu").into_response();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let missing = AppError::NotFound("Cliente").into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let persistence = AppError::Persistence("commit".into()).into_response();
        assert_eq!(persistence.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
