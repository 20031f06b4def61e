// src/services/import_service.rs

//! Importação de clientes a partir de planilha, conciliando pelo CNPJ.
//!
//! Toda a planilha roda numa transação só. Cada linha ganha um savepoint:
//! se a linha falhar, o erro vai para o resumo, as escritas dela são
//! desfeitas e a próxima linha segue. Falha no commit final desfaz tudo.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{
        clock::Clock,
        error::AppError,
        text::{clean, digits_only},
    },
    db::{Database, ImportRepository, Store, UnitOfWork, UserRepository},
    models::{
        auth::Identity,
        client::{ClientAttributes, ClientOrigin},
        import::{ImportSummary, NewImportBatch},
    },
    services::{
        client_service::ClientService,
        spreadsheet::{self, Spreadsheet},
    },
};

/// Posição de cada campo na planilha, resolvida uma vez antes das linhas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub kind: usize,
    pub tax_id: usize,
    pub consultant_text: usize,
    pub representative: usize,
    pub client_name: usize,
    pub phone: usize,
    /// Primeira outra coluna com "tel" no cabeçalho, usada quando o telefone posicional está vazio.
    pub phone_fallback: Option<usize>,
}

impl ColumnMap {
    pub fn resolve(headers: &[String]) -> Self {
        const PHONE: usize = 5;

        let phone_fallback = headers
            .iter()
            .enumerate()
            .find(|(i, h)| *i != PHONE && h.to_lowercase().contains("tel"))
            .map(|(i, _)| i);

        Self {
            kind: 0,
            tax_id: 1,
            consultant_text: 2,
            representative: 3,
            client_name: 4,
            phone: PHONE,
            phone_fallback,
        }
    }

    /// Campos normalizados da linha; `None` quando a linha está toda em branco.
    pub fn extract(&self, row: &[String]) -> Option<RowFields> {
        let mut phone = digits_only(Spreadsheet::cell(row, self.phone));
        if phone.is_empty() {
            if let Some(fallback) = self.phone_fallback {
                phone = digits_only(Spreadsheet::cell(row, fallback));
            }
        }

        let fields = RowFields {
            kind: clean(Spreadsheet::cell(row, self.kind)),
            tax_id: digits_only(Spreadsheet::cell(row, self.tax_id)),
            consultant_text: clean(Spreadsheet::cell(row, self.consultant_text)),
            representative: clean(Spreadsheet::cell(row, self.representative)),
            client_name: clean(Spreadsheet::cell(row, self.client_name)),
            phone,
        };

        if fields.is_blank() { None } else { Some(fields) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFields {
    pub kind: String,
    pub tax_id: String,
    pub consultant_text: String,
    pub representative: String,
    pub client_name: String,
    pub phone: String,
}

impl RowFields {
    fn is_blank(&self) -> bool {
        [
            &self.kind,
            &self.tax_id,
            &self.consultant_text,
            &self.representative,
            &self.client_name,
            &self.phone,
        ]
        .iter()
        .all(|f| f.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Inserted,
    Updated,
    Skipped,
}

#[derive(Clone)]
pub struct ImportService<D: Database> {
    db: D,
    clock: Arc<dyn Clock>,
    registry: ClientService<D>,
}

impl<D: Database> ImportService<D> {
    pub fn new(db: D, clock: Arc<dyn Clock>, registry: ClientService<D>) -> Self {
        Self { db, clock, registry }
    }

    /// Lê o arquivo enviado e importa.
    pub async fn import_file(
        &self,
        identity: &Identity,
        consultant_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ImportSummary, AppError> {
        identity.require_supervisor()?;
        let sheet = spreadsheet::parse(file_name, bytes)?;
        self.import(identity, consultant_id, file_name, &sheet).await
    }

    pub async fn import(
        &self,
        identity: &Identity,
        consultant_id: Uuid,
        file_name: &str,
        sheet: &Spreadsheet,
    ) -> Result<ImportSummary, AppError> {
        identity.require_supervisor()?;

        let mut tx = self.db.begin().await?;

        if tx.find_user(consultant_id).await?.is_none() {
            return Err(AppError::NotFound("Consultor"));
        }

        let columns = ColumnMap::resolve(&sheet.headers);
        let mut summary = ImportSummary::default();

        for (i, row) in sheet.rows.iter().enumerate() {
            let Some(fields) = columns.extract(row) else {
                continue;
            };

            tx.savepoint().await?;
            match self.reconcile(&mut tx, fields, consultant_id).await {
                Ok(outcome) => {
                    tx.release_savepoint().await?;
                    match outcome {
                        RowOutcome::Inserted => summary.inserted += 1,
                        RowOutcome::Updated => summary.updated += 1,
                        RowOutcome::Skipped => summary.skipped += 1,
                    }
                }
                Err(e) => {
                    tx.rollback_to_savepoint().await?;
                    // +2: linha 1 é o cabeçalho
                    summary.errors.push(format!("Linha {}: {}", i + 2, e));
                }
            }
        }

        // 2. Auditoria (melhor esforço)
        let batch = NewImportBatch {
            file_name: if file_name.trim().is_empty() { "upload".to_string() } else { file_name.to_string() },
            consultant_id,
            imported_count: i32::try_from(summary.imported()).unwrap_or(i32::MAX),
            imported_at: self.clock.now(),
        };
        tx.savepoint().await?;
        match tx.record_import(batch).await {
            Ok(()) => tx.release_savepoint().await?,
            Err(e) => {
                tracing::warn!("⚠️ Falha ao registrar auditoria da importação: {}", e);
                tx.rollback_to_savepoint().await?;
            }
        }

        // 3. Tudo ou nada
        tx.commit().await?;

        tracing::info!(
            "📥 Importação '{}' concluída: {} inseridos, {} atualizados, {} pulados, {} erros",
            file_name,
            summary.inserted,
            summary.updated,
            summary.skipped,
            summary.errors.len()
        );
        Ok(summary)
    }

    async fn reconcile<S: Store>(&self, store: &mut S, row: RowFields, consultant_id: Uuid) -> Result<RowOutcome, AppError> {
        if row.client_name.is_empty() {
            return Ok(RowOutcome::Skipped);
        }

        let attrs = ClientAttributes {
            name: Some(row.client_name),
            tax_id: Some(row.tax_id),
            phone: Some(row.phone),
            representative_name: Some(row.representative),
            consultant_id: Some(consultant_id),
            origin: Some(ClientOrigin::Imported),
        }
        .normalized();

        if let Some(tax_id) = attrs.tax_id.clone() {
            // a. CNPJ ativo: mescla o que mudou
            if let Some(mut client) = self.registry.find_active_by_tax_id(store, &tax_id).await? {
                let previous_owner = client.consultant_id;
                let changed = self.registry.update(store, &mut client, attrs).await?;

                if previous_owner != client.consultant_id {
                    tracing::info!(
                        "🔁 Cliente {} passou do consultor {} para {} na importação",
                        client.id,
                        previous_owner,
                        client.consultant_id
                    );
                }
                return Ok(if changed { RowOutcome::Updated } else { RowOutcome::Skipped });
            }

            // b. CNPJ só entre inativos: reativa
            if let Some(mut client) = self.registry.find_inactive_by_tax_id(store, &tax_id).await? {
                self.registry.reactivate(store, &mut client, attrs).await?;
                return Ok(RowOutcome::Updated);
            }
        }

        // c. Novo cliente
        self.registry.create(store, attrs).await?;
        Ok(RowOutcome::Inserted)
    }
}
