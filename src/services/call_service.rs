// src/services/call_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{
        clock::{Clock, LocalCalendar},
        error::AppError,
        text::{non_blank, parse_sale_value, truncate_chars},
    },
    db::{CallRepository, ClientRepository, Database, Store, UnitOfWork},
    models::{
        auth::Identity,
        call::{Call, CallHistoryEntry, CallInput, CallOutcome, NewCall},
        client::{Client, NAME_MAX_CHARS},
    },
    services::bucketing,
};

/// Livro de ligações: só acrescenta; a única edição permitida é a observação.
#[derive(Clone)]
pub struct CallService<D: Database> {
    db: D,
    clock: Arc<dyn Clock>,
    calendar: LocalCalendar,
}

impl<D: Database> CallService<D> {
    pub fn new(db: D, clock: Arc<dyn Clock>, calendar: LocalCalendar) -> Self {
        Self { db, clock, calendar }
    }

    // =========================================================================
    //  1. NÚCLEO (roda dentro da unidade de trabalho de quem chama)
    // =========================================================================

    /// Grava a ligação e recalcula o retorno agendado do cliente.
    pub async fn append<S: Store>(
        &self,
        store: &mut S,
        client_id: Uuid,
        consultant_id: Uuid,
        input: &CallInput,
    ) -> Result<Call, AppError> {
        let client = store
            .find_client(client_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;

        self.append_to(store, client, consultant_id, input).await
    }

    async fn append_to<S: Store>(
        &self,
        store: &mut S,
        mut client: Client,
        consultant_id: Uuid,
        input: &CallInput,
    ) -> Result<Call, AppError> {
        let now = self.clock.now();
        let outcome = CallOutcome::coerce(&input.outcome);
        let sale_value = input
            .sale_value
            .as_deref()
            .map(parse_sale_value)
            .unwrap_or(Decimal::ZERO);

        let call = store
            .insert_call(NewCall {
                client_id: client.id,
                consultant_id,
                called_at: now,
                note: input.note.as_deref().and_then(non_blank),
                contact_name: input
                    .contact_name
                    .as_deref()
                    .and_then(non_blank)
                    .map(|n| truncate_chars(&n, NAME_MAX_CHARS)),
                outcome,
                sale_value,
            })
            .await?;

        // "retornar" agenda, qualquer outro resultado limpa
        client.next_call_at = bucketing::scheduled_return(
            outcome,
            input.return_date.as_deref(),
            input.return_days,
            now,
            &self.calendar,
        );
        store.save_client(&client).await?;

        Ok(call)
    }

    // =========================================================================
    //  2. OPERAÇÕES COM IDENTIDADE
    // =========================================================================

    pub async fn log_call(&self, identity: &Identity, client_id: Uuid, input: CallInput) -> Result<Call, AppError> {
        let mut tx = self.db.begin().await?;

        let client = tx
            .find_client(client_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;

        if !identity.can_act_for(client.consultant_id) {
            return Err(AppError::forbidden("Sem permissão para este cliente."));
        }

        let call = self.append_to(&mut tx, client, identity.user_id, &input).await?;
        tx.commit().await?;

        tracing::info!(
            "📞 Ligação registrada: cliente {} resultado {}",
            call.client_id,
            call.outcome.as_str()
        );
        Ok(call)
    }

    /// Histórico do cliente, mais recente primeiro.
    pub async fn history_for(&self, identity: &Identity, client_id: Uuid) -> Result<Vec<CallHistoryEntry>, AppError> {
        let mut tx = self.db.begin().await?;

        let client = tx
            .find_client(client_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;

        if !identity.can_act_for(client.consultant_id) {
            return Err(AppError::forbidden("Sem permissão para este cliente."));
        }

        let calls = tx.calls_of_client(client_id).await?;
        Ok(calls
            .into_iter()
            .map(|c| CallHistoryEntry {
                can_edit: identity.can_act_for(c.call.consultant_id),
                consultant_name: c.consultant_name,
                call: c.call,
            })
            .collect())
    }

    /// Só o autor da ligação ou um supervisor. Observação vazia vira nula.
    pub async fn edit_note(&self, identity: &Identity, call_id: Uuid, note: Option<&str>) -> Result<Call, AppError> {
        let mut tx = self.db.begin().await?;

        let mut call = tx
            .find_call(call_id)
            .await?
            .ok_or(AppError::NotFound("Ligação"))?;

        if !identity.can_act_for(call.consultant_id) {
            return Err(AppError::forbidden("Sem permissão para editar esta ligação."));
        }

        call.note = note.and_then(non_blank);
        tx.update_call_note(call.id, call.note.as_deref()).await?;
        tx.commit().await?;

        Ok(call)
    }
}
