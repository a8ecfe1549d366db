//! Compression endpoint
//!
//! POST /compress - multipart upload with a single `pdf` file field.
//! Responds with the compressed PDF as an attachment, or a JSON error.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    response::Response,
    routing::post,
    Router,
};

use crate::error::Result;
use crate::pipeline::CompressionPipeline;
use crate::state::AppState;
use crate::storage::TempFiles;
use crate::upload::{self, ValidationError, MULTIPART_OVERHEAD_BYTES};

/// Create the compression router
pub fn router(max_upload_bytes: u64) -> Router<AppState> {
    Router::new()
        .route("/compress", post(compress_pdf))
        .layer(DefaultBodyLimit::max(body_limit(max_upload_bytes)))
}

fn body_limit(max_upload_bytes: u64) -> usize {
    usize::try_from(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX)
}

/// POST /compress
async fn compress_pdf(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let multipart = multipart.map_err(|e| ValidationError::Malformed(e.body_text()))?;
    let max_bytes = state.config().storage.max_upload_bytes;

    let mut files = TempFiles::new();
    let upload = match upload::receive_pdf(multipart, state.store(), &mut files, max_bytes).await {
        Ok(upload) => upload,
        Err(e) => {
            tracing::warn!(error = %e, "Upload rejected");
            files.cleanup().await;
            return Err(e);
        }
    };

    tracing::info!(
        upload_id = %upload.id,
        file_name = %upload.original_name,
        size = upload.size,
        "Compressing PDF"
    );

    CompressionPipeline::new(state.store(), state.compressor())
        .run(upload, files)
        .await?
        .deliver()
}
