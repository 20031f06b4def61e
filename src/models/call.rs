// src/models/call.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// Mapeia o CREATE TYPE call_outcome do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "call_outcome", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Purchased,
    NotPurchased,
    CallBack,
    NotInterested,
    Relationship,
    ClientInactive,
}

impl CallOutcome {
    pub const ALL: [CallOutcome; 6] = [
        CallOutcome::Purchased,
        CallOutcome::NotPurchased,
        CallOutcome::CallBack,
        CallOutcome::NotInterested,
        CallOutcome::Relationship,
        CallOutcome::ClientInactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Purchased => "purchased",
            CallOutcome::NotPurchased => "not_purchased",
            CallOutcome::CallBack => "call_back",
            CallOutcome::NotInterested => "not_interested",
            CallOutcome::Relationship => "relationship",
            CallOutcome::ClientInactive => "client_inactive",
        }
    }

    /// Resultado desconhecido não é rejeitado: vira `not_purchased`.
    /// Os nomes antigos do formulário (comprou, retornar...) também valem.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "purchased" | "comprou" => CallOutcome::Purchased,
            "call_back" | "retornar" => CallOutcome::CallBack,
            "not_interested" | "sem_interesse" => CallOutcome::NotInterested,
            "relationship" | "relacionamento" => CallOutcome::Relationship,
            "client_inactive" | "cliente_inativo" => CallOutcome::ClientInactive,
            _ => CallOutcome::NotPurchased,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: Uuid,
    pub client_id: Uuid,
    pub consultant_id: Uuid,
    pub called_at: DateTime<Utc>,
    pub note: Option<String>,
    pub contact_name: Option<String>,
    pub outcome: CallOutcome,
    pub sale_value: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewCall {
    pub client_id: Uuid,
    pub consultant_id: Uuid,
    pub called_at: DateTime<Utc>,
    pub note: Option<String>,
    pub contact_name: Option<String>,
    pub outcome: CallOutcome,
    pub sale_value: Decimal,
}

/// Ligação + nome de quem ligou (para o histórico).
#[derive(Debug, Clone, FromRow)]
pub struct CallWithConsultant {
    #[sqlx(flatten)]
    pub call: Call,
    pub consultant_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallHistoryEntry {
    #[serde(flatten)]
    pub call: Call,
    pub consultant_name: String,
    pub can_edit: bool,
}

/// Dados brutos de uma ligação como chegam do formulário.
/// Resultado e valor chegam como texto e são normalizados no serviço.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallInput {
    #[serde(default)]
    pub outcome: String,
    pub note: Option<String>,
    pub contact_name: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub sale_value: Option<String>,
    // Só contam quando o resultado é "retornar"
    pub return_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_days")]
    pub return_days: Option<i64>,
}

// O formulário manda valor como "1500,50" ou como número puro
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// Dias inválidos são ignorados (caem no padrão de 30 dias)
fn lenient_days<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
pub struct EditNotePayload {
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_accepts_known_outcomes() {
        for outcome in CallOutcome::ALL {
            assert_eq!(CallOutcome::coerce(outcome.as_str()), outcome);
        }
        assert_eq!(CallOutcome::coerce(" Retornar "), CallOutcome::CallBack);
        assert_eq!(CallOutcome::coerce("comprou"), CallOutcome::Purchased);
    }

    #[test]
    fn call_input_accepts_numbers_or_text() {
        let input: CallInput = serde_json::from_value(serde_json::json!({
            "outcome": "call_back",
            "saleValue": 1500.5,
            "returnDays": "15"
        }))
        .unwrap();
        assert_eq!(input.sale_value.as_deref(), Some("1500.5"));
        assert_eq!(input.return_days, Some(15));

        let input: CallInput = serde_json::from_value(serde_json::json!({
            "saleValue": "99,90",
            "returnDays": "quinze"
        }))
        .unwrap();
        assert_eq!(input.sale_value.as_deref(), Some("99,90"));
        assert_eq!(input.return_days, None);
        assert_eq!(input.outcome, "");
    }

    #[test]
    fn coerce_falls_back_to_not_purchased() {
        assert_eq!(CallOutcome::coerce(""), CallOutcome::NotPurchased);
        assert_eq!(CallOutcome::coerce("talvez"), CallOutcome::NotPurchased);
    }
}
