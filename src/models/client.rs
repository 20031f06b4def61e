// src/models/client.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::text::{digits_only, non_blank, truncate_chars};

pub const NAME_MAX_CHARS: usize = 200;
pub const TAX_ID_MAX_DIGITS: usize = 18;

// --- ENUMS ---

// Mapeia o CREATE TYPE client_origin do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "client_origin", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClientOrigin {
    Imported,
    Manual,
}

// --- CLIENTE ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub representative_name: Option<String>,
    pub consultant_id: Uuid,
    pub active: bool,

    // Retorno agendado (só existe quando a última ligação foi "retornar")
    pub next_call_at: Option<DateTime<Utc>>,

    pub origin: ClientOrigin,
    pub created_at: DateTime<Utc>,
}

/// Atributos de entrada do cadastro. Tudo opcional: `create` exige nome e
/// consultor, `update` só aplica o que veio preenchido.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientAttributes {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub representative_name: Option<String>,
    pub consultant_id: Option<Uuid>,
    pub origin: Option<ClientOrigin>,
}

impl ClientAttributes {
    /// Limpa, corta e deixa CNPJ/telefone só com dígitos. Vazio vira `None`.
    pub fn normalized(self) -> Self {
        Self {
            name: self
                .name
                .as_deref()
                .and_then(non_blank)
                .map(|n| truncate_chars(&n, NAME_MAX_CHARS)),
            tax_id: self
                .tax_id
                .as_deref()
                .map(digits_only)
                .filter(|d| !d.is_empty())
                .map(|d| truncate_chars(&d, TAX_ID_MAX_DIGITS)),
            phone: self.phone.as_deref().map(digits_only).filter(|d| !d.is_empty()),
            representative_name: self
                .representative_name
                .as_deref()
                .and_then(non_blank)
                .map(|r| truncate_chars(&r, NAME_MAX_CHARS)),
            consultant_id: self.consultant_id,
            origin: self.origin,
        }
    }
}

/// Linha pronta para INSERT.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub representative_name: Option<String>,
    pub consultant_id: Uuid,
    pub origin: ClientOrigin,
    pub created_at: DateTime<Utc>,
}

/// Cliente + resumo do histórico de ligações (o suficiente para a aba).
#[derive(Debug, Clone, FromRow)]
pub struct ClientOverview {
    #[sqlx(flatten)]
    pub client: Client,
    pub total_calls: i64,
    pub last_call_at: Option<DateTime<Utc>>,
}

/// Filtro da listagem de clientes ativos.
#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub consultant_id: Option<Uuid>,
    pub search: Option<String>,
}

// --- ABAS (derivadas, nunca persistidas) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    #[default]
    Pending,
    Contacted,
    NeedsFollowUp,
}

/// Recorte de tempo aplicado só à aba "contatados".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactedWindow {
    /// Última ligação nos últimos 7 dias.
    Recent,
    /// Última ligação há mais de 30 dias.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketStatus {
    pub bucket: Bucket,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCard {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub representative_name: Option<String>,
    pub consultant_id: Uuid,
    pub origin: ClientOrigin,
    pub total_calls: i64,
    pub last_call_at: Option<DateTime<Utc>>,
    pub next_call_at: Option<DateTime<Utc>>,
    pub bucket: Bucket,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientListing {
    pub tab: Bucket,
    pub total_pending: usize,
    pub total_contacted: usize,
    pub total_follow_up: usize,
    pub clients: Vec<ClientCard>,
}

// --- PAYLOADS HTTP ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClientsQuery {
    #[serde(default)]
    pub tab: Bucket,
    // Só para supervisor: restringe aos clientes dele mesmo
    #[serde(default)]
    pub only_mine: bool,
    pub q: Option<String>,
    pub window: Option<ContactedWindow>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientPayload {
    #[validate(length(min = 1, message = "Nome é obrigatório"))]
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub representative_name: Option<String>,
    // Supervisor pode cadastrar para outro consultor
    pub consultant_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoveClientPayload {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearConsultantPayload {
    pub consultant_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_attributes_keep_only_digits_and_trim_text() {
        let attrs = ClientAttributes {
            name: Some("  Padaria Central  ".into()),
            tax_id: Some("12.345.678/0001-99".into()),
            phone: Some("(54) 3333-4444".into()),
            representative_name: Some("   ".into()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(attrs.name.as_deref(), Some("Padaria Central"));
        assert_eq!(attrs.tax_id.as_deref(), Some("12345678000199"));
        assert_eq!(attrs.phone.as_deref(), Some("5433334444"));
        assert_eq!(attrs.representative_name, None);
    }

    #[test]
    fn normalized_truncates_long_values() {
        let attrs = ClientAttributes {
            name: Some("x".repeat(250)),
            tax_id: Some("1".repeat(25)),
            ..Default::default()
        }
        .normalized();

        assert_eq!(attrs.name.unwrap().chars().count(), NAME_MAX_CHARS);
        assert_eq!(attrs.tax_id.unwrap().len(), TAX_ID_MAX_DIGITS);
    }
}
