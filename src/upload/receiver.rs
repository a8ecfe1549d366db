//! Multipart receiver

use std::path::Path;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use tokio::io::AsyncWriteExt;

use super::types::{
    StoredUpload, ValidationError, FILE_FIELD, PDF_HEADER_WINDOW, PDF_MAGIC, PDF_MIME_TYPE,
};
use crate::error::{AppError, Result};
use crate::storage::{TempFileStore, TempFiles};

/// Read the multipart body and store the single `pdf` file field.
///
/// Every path written is registered in `files` before any bytes land on disk,
/// so the caller can clean up after a rejection.
pub async fn receive_pdf(
    mut multipart: Multipart,
    store: &TempFileStore,
    files: &mut TempFiles,
    max_bytes: u64,
) -> Result<StoredUpload> {
    let mut stored: Option<StoredUpload> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let name = field.name().unwrap_or("").to_string();

        let Some(original_name) = field.file_name().map(|s| s.to_string()) else {
            tracing::debug!(field = %name, "Ignoring non-file field");
            continue;
        };

        if name != FILE_FIELD {
            return Err(ValidationError::UnexpectedField(name).into());
        }

        if stored.is_some() {
            return Err(ValidationError::MultipleFiles.into());
        }

        let content_type = field.content_type().unwrap_or("").to_string();
        if !is_pdf_content_type(&content_type) {
            let shown = if content_type.is_empty() {
                "none".to_string()
            } else {
                content_type
            };
            return Err(ValidationError::InvalidFileType(shown).into());
        }

        let (id, path) = store.allocate_upload();
        files.track(&path);

        let size = write_field(&mut field, &path, max_bytes).await?;

        tracing::debug!(
            upload_id = %id,
            file_name = %original_name,
            size = size,
            "Upload stored"
        );

        stored = Some(StoredUpload {
            id,
            original_name,
            content_type,
            size,
            path,
        });
    }

    stored.ok_or_else(|| ValidationError::MissingFile.into())
}

/// Compare the MIME essence, ignoring parameters and case
pub fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MIME_TYPE))
        .unwrap_or(false)
}

fn contains_pdf_header(head: &[u8]) -> bool {
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Stream one field to `path`, enforcing the size ceiling as bytes arrive
async fn write_field(field: &mut Field<'_>, path: &Path, max_bytes: u64) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut size: u64 = 0;
    let mut head: Vec<u8> = Vec::with_capacity(PDF_HEADER_WINDOW);

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        size += chunk.len() as u64;
        if size > max_bytes {
            return Err(ValidationError::FileTooLarge { max: max_bytes }.into());
        }

        if head.len() < PDF_HEADER_WINDOW {
            let take = (PDF_HEADER_WINDOW - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..take]);
        }

        file.write_all(&chunk).await?;
    }

    file.flush().await?;

    if size == 0 {
        return Err(ValidationError::EmptyFile.into());
    }

    if !contains_pdf_header(&head) {
        return Err(ValidationError::NotAPdf.into());
    }

    Ok(size)
}

fn multipart_error(err: MultipartError, max_bytes: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ValidationError::FileTooLarge { max: max_bytes }.into();
    }

    tracing::warn!("Failed to read multipart field: {}", err);
    ValidationError::Malformed(err.body_text()).into()
}
