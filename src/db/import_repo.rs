// src/db/import_repo.rs

use crate::{
    common::error::AppError,
    db::{pg::PgStore, repository::ImportRepository},
    models::import::NewImportBatch,
};

impl ImportRepository for PgStore {
    async fn record_import(&mut self, batch: NewImportBatch) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO import_batches (file_name, consultant_id, imported_count, imported_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&batch.file_name)
        .bind(batch.consultant_id)
        .bind(batch.imported_count)
        .bind(batch.imported_at)
        .execute(self.conn())
        .await?;

        Ok(())
    }
}
