// src/models/dashboard.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::call::CallOutcome;

/// Janela [from, to) de ligações, opcionalmente de um consultor só.
#[derive(Debug, Clone, Copy)]
pub struct CallWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub consultant_id: Option<Uuid>,
}

// Contagens agregadas de uma janela
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CallStats {
    pub calls: i64,
    pub sales: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub day: NaiveDate,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeCount {
    pub outcome: CallOutcome,
    pub total: i64,
}

/// Desempenho de um consultor ativo numa janela (linha do LEFT JOIN).
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConsultantPerformance {
    pub consultant_id: Uuid,
    pub name: String,
    pub daily_goal: i32,
    pub calls: i64,
    pub sales: i64,
    pub revenue: Decimal,
}

/// Ligação de um consultor com o nome do cliente.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConsultantCall {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub called_at: DateTime<Utc>,
    pub outcome: CallOutcome,
    pub sale_value: Decimal,
    pub note: Option<String>,
}

/// Ligação do detalhamento de um dia, com consultor e cliente.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DayCall {
    pub id: Uuid,
    pub called_at: DateTime<Utc>,
    pub consultant_name: String,
    pub client_name: String,
    pub contact_name: Option<String>,
    pub outcome: CallOutcome,
    pub sale_value: Decimal,
    pub note: Option<String>,
}

// --- Saídas dos painéis ---

// 1. Cards do consultor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultantStats {
    pub total_clients: i64,
    pub calls_today: i64,
    pub calls_week: i64,
    pub calls_month: i64,
    pub daily_goal: i32,
    pub goal_progress: f64,   // % da meta diária
    pub conversion_rate: f64, // % de "comprou" nos últimos 30 dias
    pub revenue_month: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub name: String,
    pub calls: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub consultant_id: Uuid,
    pub name: String,
    pub goal: i32,
    pub done: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionEntry {
    pub consultant_id: Uuid,
    pub name: String,
    pub calls: i64,
    pub sales: i64,
    pub conversion: f64,
    pub revenue: Decimal,
}

// 2. Painel do supervisor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorDashboard {
    pub total_consultants: i64,
    pub total_clients: i64,
    pub total_calls: i64,
    pub calls_today: i64,
    pub ranking: Vec<RankingEntry>,
    pub calls_per_day: Vec<DailyCount>,
    pub outcomes: Vec<OutcomeCount>,
    pub goal_progress: Vec<GoalProgress>,
    pub conversion: Vec<ConversionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

// 3. Resultados por mês (supervisor)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyResults {
    pub month: u32,
    pub year: i32,
    pub consultants: Vec<ConversionEntry>,
}

// 4. Minhas ligações do mês (consultor)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyMonthlyCalls {
    pub month: u32,
    pub year: i32,
    pub calls: Vec<ConsultantCall>,
    pub total_calls: i64,
    pub sales: i64,
    pub revenue: Decimal,
    pub conversion_rate: f64,
}

// 5. Relatório diário (o mesmo que seria enviado por e-mail)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub date: NaiveDate,
    pub calls_today: i64,
    pub calls_week: i64,
    pub calls_month: i64,
    pub purchases_month: i64,
    pub conversion_month: f64,
    pub revenue_month: Decimal,
    pub outcomes: Vec<OutcomeCount>,
    pub consultants: Vec<ConversionEntry>,
}
