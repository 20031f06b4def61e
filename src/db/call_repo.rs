// src/db/call_repo.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{pg::PgStore, repository::CallRepository},
    models::call::{Call, CallWithConsultant, NewCall},
};

impl CallRepository for PgStore {
    async fn insert_call(&mut self, call: NewCall) -> Result<Call, AppError> {
        let call = sqlx::query_as::<_, Call>(
            r#"
            INSERT INTO calls (
                client_id, consultant_id, called_at, note, contact_name, outcome, sale_value
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, client_id, consultant_id, called_at, note, contact_name, outcome, sale_value
            "#,
        )
        .bind(call.client_id)
        .bind(call.consultant_id)
        .bind(call.called_at)
        .bind(&call.note)
        .bind(&call.contact_name)
        .bind(call.outcome)
        .bind(call.sale_value)
        .fetch_one(self.conn())
        .await?;

        Ok(call)
    }

    async fn find_call(&mut self, id: Uuid) -> Result<Option<Call>, AppError> {
        let call = sqlx::query_as::<_, Call>(
            r#"
            SELECT id, client_id, consultant_id, called_at, note, contact_name, outcome, sale_value
            FROM calls
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.conn())
        .await?;

        Ok(call)
    }

    async fn calls_of_client(&mut self, client_id: Uuid) -> Result<Vec<CallWithConsultant>, AppError> {
        let calls = sqlx::query_as::<_, CallWithConsultant>(
            r#"
            SELECT l.id, l.client_id, l.consultant_id, l.called_at, l.note, l.contact_name,
                   l.outcome, l.sale_value,
                   u.name AS consultant_name
            FROM calls l
            INNER JOIN users u ON u.id = l.consultant_id
            WHERE l.client_id = $1
            ORDER BY l.called_at DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(self.conn())
        .await?;

        Ok(calls)
    }

    async fn update_call_note(&mut self, id: Uuid, note: Option<&str>) -> Result<(), AppError> {
        sqlx::query("UPDATE calls SET note = $2 WHERE id = $1")
            .bind(id)
            .bind(note)
            .execute(self.conn())
            .await?;

        Ok(())
    }
}
