// src/handlers/import.rs

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::RequireSupervisor,
    models::import::ImportReport,
};

/// Quantos erros de linha voltam na resposta.
const MAX_REPORTED_ERRORS: usize = 50;

fn upload_error(e: MultipartError) -> AppError {
    AppError::InvalidSpreadsheet(e.body_text())
}

// POST /api/import (multipart: consultant_id + file)
pub async fn import_clients(
    State(app_state): State<AppState>,
    supervisor: RequireSupervisor,
    mut multipart: Multipart,
) -> Result<Json<ImportReport>, AppError> {
    let mut consultant_id: Option<Uuid> = None;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        match field.name() {
            Some("consultant_id") | Some("consultantId") => {
                let raw = field.text().await.map_err(upload_error)?;
                consultant_id = Uuid::parse_str(raw.trim()).ok();
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(upload_error)?;
                upload = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let consultant_id =
        consultant_id.ok_or_else(|| AppError::required("consultant_id", "Selecione o consultor."))?;
    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::required("file", "Selecione o arquivo da planilha."))?;

    let summary = app_state
        .import_service
        .import_file(&supervisor.identity(), consultant_id, &file_name, &bytes)
        .await?;

    Ok(Json(summary.truncated(MAX_REPORTED_ERRORS)))
}
