// src/db/note_repo.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{pg::PgStore, repository::NoteRepository},
    models::note::{NewNote, Note, NoteView},
};

impl NoteRepository for PgStore {
    async fn insert_note(&mut self, note: NewNote) -> Result<Note, AppError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (client_id, author_id, body, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, client_id, author_id, body, created_at
            "#,
        )
        .bind(note.client_id)
        .bind(note.author_id)
        .bind(&note.body)
        .bind(note.created_at)
        .fetch_one(self.conn())
        .await?;

        Ok(note)
    }

    async fn notes_of_client(&mut self, client_id: Uuid) -> Result<Vec<NoteView>, AppError> {
        let notes = sqlx::query_as::<_, NoteView>(
            r#"
            SELECT n.id, u.name AS author_name, n.body, n.created_at
            FROM notes n
            INNER JOIN users u ON u.id = n.author_id
            WHERE n.client_id = $1
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(self.conn())
        .await?;

        Ok(notes)
    }
}
