// src/services/note_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError, text::non_blank},
    db::{ClientRepository, Database, NoteRepository, UnitOfWork},
    models::{
        auth::Identity,
        note::{NewNote, Note, NoteView},
    },
};

#[derive(Clone)]
pub struct NoteService<D: Database> {
    db: D,
    clock: Arc<dyn Clock>,
}

impl<D: Database> NoteService<D> {
    pub fn new(db: D, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn add(&self, identity: &Identity, client_id: Uuid, body: &str) -> Result<Note, AppError> {
        let body = non_blank(body).ok_or_else(|| AppError::required("body", "Texto obrigatório"))?;

        let mut tx = self.db.begin().await?;

        let client = tx
            .find_client(client_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;
        if !identity.can_act_for(client.consultant_id) {
            return Err(AppError::forbidden("Sem permissão para este cliente."));
        }

        let note = tx
            .insert_note(NewNote {
                client_id,
                author_id: identity.user_id,
                body,
                created_at: self.clock.now(),
            })
            .await?;
        tx.commit().await?;

        Ok(note)
    }

    /// Notas do cliente, mais recente primeiro.
    pub async fn list(&self, identity: &Identity, client_id: Uuid) -> Result<Vec<NoteView>, AppError> {
        let mut tx = self.db.begin().await?;

        let client = tx
            .find_client(client_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;
        if !identity.can_act_for(client.consultant_id) {
            return Err(AppError::forbidden("Sem permissão para este cliente."));
        }

        tx.notes_of_client(client_id).await
    }
}
