//! Compression Pipeline
//!
//! One request, strictly in order:
//! 1. Normalize: rename the stored upload to `<id>.pdf`
//! 2. Invoke: run the compressor into `compressed_<id>.pdf`
//! 3. Verify: the output exists and is non-empty
//! 4. Deliver: stream the output back to the client
//! 5. Cleanup: remove every temp file, on every exit path
//!
//! On failure cleanup happens before the error is returned. On success the
//! temp files travel inside the response body and are removed when the body
//! is dropped, whether it was fully sent or the client went away.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use futures::Stream;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::compressor::{CompressError, CompressionJob, PdfCompressor};
use crate::error::{AppError, Result};
use crate::storage::{TempFileStore, TempFiles};
use crate::upload::{StoredUpload, PDF_MIME_TYPE};

/// Fallback label when the client name is unusable
const DEFAULT_FILE_NAME: &str = "document.pdf";

pub struct CompressionPipeline<'a> {
    store: &'a TempFileStore,
    compressor: &'a dyn PdfCompressor,
}

impl<'a> CompressionPipeline<'a> {
    pub fn new(store: &'a TempFileStore, compressor: &'a dyn PdfCompressor) -> Self {
        Self { store, compressor }
    }

    /// Run steps 1-3 and open the output for delivery.
    ///
    /// `files` must already track the upload path; the pipeline adds its own.
    pub async fn run(&self, upload: StoredUpload, mut files: TempFiles) -> Result<CompressedPdf> {
        let normalized = self.store.normalized_path(upload.id);
        let output = self.store.output_path(upload.id);
        files.track(&upload.path);
        files.track(&normalized);
        files.track(&output);

        let compressed_size = match self.process(&upload, &normalized, &output).await {
            Ok(size) => size,
            Err(e) => {
                tracing::error!(upload_id = %upload.id, error = %e, "Error processing PDF");
                files.cleanup().await;
                return Err(e);
            }
        };

        let file = match File::open(&output).await {
            Ok(file) => file,
            Err(e) => {
                files.cleanup().await;
                return Err(e.into());
            }
        };

        tracing::info!(
            upload_id = %upload.id,
            original_size = upload.size,
            compressed_size = compressed_size,
            "PDF compressed"
        );

        Ok(CompressedPdf {
            file,
            download_name: download_name(&upload.original_name),
            original_size: upload.size,
            compressed_size,
            files,
        })
    }

    async fn process(&self, upload: &StoredUpload, normalized: &Path, output: &Path) -> Result<u64> {
        // Normalize
        tokio::fs::rename(&upload.path, normalized).await?;

        // Invoke
        let job = CompressionJob::prepare(normalized.to_path_buf(), output.to_path_buf()).await?;
        self.compressor.compress(&job).await.map_err(|e| {
            e.redact(&[
                (output, "output.pdf"),
                (normalized, "input.pdf"),
                (self.store.root(), "<uploads>"),
            ])
        })?;

        // Verify
        match tokio::fs::metadata(output).await {
            Ok(metadata) if metadata.is_file() && metadata.len() > 0 => Ok(metadata.len()),
            Ok(_) => Err(CompressError::NoOutput.into()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CompressError::NoOutput.into()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A verified compressed file, ready to stream
pub struct CompressedPdf {
    file: File,
    download_name: String,
    original_size: u64,
    compressed_size: u64,
    files: TempFiles,
}

impl CompressedPdf {
    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Build the streaming response. The temp files are removed once the body
    /// is dropped.
    pub fn deliver(self) -> Result<Response> {
        let disposition = content_disposition(&self.download_name);
        let stream = CleanupStream {
            inner: ReaderStream::new(self.file),
            _files: self.files,
        };

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, PDF_MIME_TYPE)
            .header(header::CONTENT_LENGTH, self.compressed_size)
            .header(header::CONTENT_DISPOSITION, disposition)
            .header("X-Original-Size", self.original_size)
            .header("X-Compressed-Size", self.compressed_size)
            .body(Body::from_stream(stream))
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

/// Response body stream that owns the request's temp files
struct CleanupStream<S> {
    inner: S,
    _files: TempFiles,
}

impl<S> Stream for CleanupStream<S>
where
    S: Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// `compressed_<client name>`, reduced to a bare file name
pub fn download_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();
    let base = base.trim();

    if base.is_empty() || base == "." || base == ".." {
        format!("compressed_{}", DEFAULT_FILE_NAME)
    } else {
        format!("compressed_{}", base)
    }
}

/// Attachment header with an ASCII fallback and an RFC 5987 UTF-8 name
pub fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(file_name)
    )
}
