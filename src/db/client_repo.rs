// src/db/client_repo.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        pg::{unique_or, PgStore},
        repository::ClientRepository,
    },
    models::client::{Client, ClientFilter, ClientOverview, NewClient},
};

impl ClientRepository for PgStore {
    async fn find_client(&mut self, id: Uuid) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, tax_id, phone, representative_name, consultant_id,
                   active, next_call_at, origin, created_at
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.conn())
        .await?;

        Ok(client)
    }

    async fn find_client_by_tax_id(&mut self, tax_id: &str, active: bool) -> Result<Option<Client>, AppError> {
        // Pode haver vários inativos com o mesmo CNPJ: pega o mais recente
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, tax_id, phone, representative_name, consultant_id,
                   active, next_call_at, origin, created_at
            FROM clients
            WHERE tax_id = $1 AND active = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(tax_id)
        .bind(active)
        .fetch_optional(self.conn())
        .await?;

        Ok(client)
    }

    async fn insert_client(&mut self, client: NewClient) -> Result<Client, AppError> {
        let tax_id = client.tax_id.clone();

        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (
                name, tax_id, phone, representative_name, consultant_id,
                active, origin, created_at
            )
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7)
            RETURNING id, name, tax_id, phone, representative_name, consultant_id,
                      active, next_call_at, origin, created_at
            "#,
        )
        .bind(&client.name)
        .bind(&client.tax_id)
        .bind(&client.phone)
        .bind(&client.representative_name)
        .bind(client.consultant_id)
        .bind(client.origin)
        .bind(client.created_at)
        .fetch_one(self.conn())
        .await
        .map_err(|e| {
            unique_or(e, || {
                AppError::UniqueConstraintViolation(format!(
                    "Já existe um cliente ativo com o CNPJ '{}'.",
                    tax_id.as_deref().unwrap_or("?")
                ))
            })
        })
    }

    async fn save_client(&mut self, client: &Client) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE clients
            SET name = $2,
                tax_id = $3,
                phone = $4,
                representative_name = $5,
                consultant_id = $6,
                active = $7,
                next_call_at = $8,
                origin = $9
            WHERE id = $1
            "#,
        )
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.tax_id)
        .bind(&client.phone)
        .bind(&client.representative_name)
        .bind(client.consultant_id)
        .bind(client.active)
        .bind(client.next_call_at)
        .bind(client.origin)
        .execute(self.conn())
        .await
        .map_err(|e| {
            unique_or(e, || {
                AppError::UniqueConstraintViolation(format!(
                    "Já existe um cliente ativo com o CNPJ '{}'.",
                    client.tax_id.as_deref().unwrap_or("?")
                ))
            })
        })?;

        Ok(())
    }

    async fn list_client_overviews(&mut self, filter: &ClientFilter) -> Result<Vec<ClientOverview>, AppError> {
        // Busca literal: `%` e `_` digitados pelo usuário não são curingas
        let search_term = filter.search.as_deref();

        let rows = sqlx::query_as::<_, ClientOverview>(
            r#"
            SELECT c.id, c.name, c.tax_id, c.phone, c.representative_name, c.consultant_id,
                   c.active, c.next_call_at, c.origin, c.created_at,
                   COUNT(l.id) AS total_calls,
                   MAX(l.called_at) AS last_call_at
            FROM clients c
            LEFT JOIN calls l ON l.client_id = c.id
            WHERE c.active = TRUE
              AND ($1::uuid IS NULL OR c.consultant_id = $1)
              AND (
                  $2::text IS NULL
                  OR strpos(lower(c.name), lower($2)) > 0
                  OR strpos(lower(c.tax_id), lower($2)) > 0
                  OR strpos(lower(c.phone), lower($2)) > 0
                  OR strpos(lower(c.representative_name), lower($2)) > 0
              )
            GROUP BY c.id
            ORDER BY c.name ASC
            "#,
        )
        .bind(filter.consultant_id)
        .bind(search_term)
        .fetch_all(self.conn())
        .await?;

        Ok(rows)
    }

    async fn deactivate_clients_of(&mut self, consultant_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE clients SET active = FALSE WHERE consultant_id = $1 AND active = TRUE")
            .bind(consultant_id)
            .execute(self.conn())
            .await?;

        Ok(result.rows_affected())
    }
}
