// src/models/import.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Registro de auditoria de uma importação (melhor esforço).
#[derive(Debug, Clone)]
pub struct NewImportBatch {
    pub file_name: String,
    pub consultant_id: Uuid,
    pub imported_count: i32,
    pub imported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub id: Uuid,
    pub file_name: String,
    pub consultant_id: Uuid,
    pub imported_count: i32,
    pub imported_at: DateTime<Utc>,
}

/// Resultado de uma importação.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    // "Linha N: mensagem", N contando o cabeçalho
    pub errors: Vec<String>,
}

impl ImportSummary {
    /// Inseridos + atualizados/reativados (o que vai para a auditoria).
    pub fn imported(&self) -> usize {
        self.inserted + self.updated
    }

    /// Cópia com no máximo `limit` mensagens de erro, para exibição.
    pub fn truncated(&self, limit: usize) -> ImportReport {
        ImportReport {
            inserted: self.inserted,
            updated: self.updated,
            skipped: self.skipped,
            total_errors: self.errors.len(),
            errors: self.errors.iter().take(limit).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub total_errors: usize,
    pub errors: Vec<String>,
}
