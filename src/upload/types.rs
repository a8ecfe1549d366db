//! Upload types

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Multipart field that must carry the PDF
pub const FILE_FIELD: &str = "pdf";

/// The only accepted declared content type
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// PDF header signature
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Readers accept the header anywhere in the first 1024 bytes
pub const PDF_HEADER_WINDOW: usize = 1024;

/// Slack on top of the file ceiling for multipart boundaries and headers
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

// ============================================================================
// Stored Upload
// ============================================================================

/// A PDF that has been fully received and written to the upload directory
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Generated identifier; all temp file names derive from it
    pub id: Uuid,

    /// Client-supplied file name, for labeling the response only
    pub original_name: String,

    /// Declared MIME type
    pub content_type: String,

    /// Bytes written
    pub size: u64,

    /// Extension-less path inside the upload directory
    pub path: PathBuf,
}

// ============================================================================
// Errors
// ============================================================================

/// Client-caused upload rejections (HTTP 400)
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Only one file can be compressed per request")]
    MultipleFiles,

    #[error("Unexpected file field '{0}', expected 'pdf'")]
    UnexpectedField(String),

    #[error("Only PDF files are allowed (got '{0}')")]
    InvalidFileType(String),

    #[error("Uploaded file is not a PDF document")]
    NotAPdf,

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("File too large (limit is {max} bytes)")]
    FileTooLarge { max: u64 },

    #[error("Malformed upload: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFile => "NO_FILE",
            Self::MultipleFiles => "MULTIPLE_FILES",
            Self::UnexpectedField(_) => "UNEXPECTED_FIELD",
            Self::InvalidFileType(_) => "INVALID_FILE_TYPE",
            Self::NotAPdf => "NOT_A_PDF",
            Self::EmptyFile => "EMPTY_FILE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::Malformed(_) => "MALFORMED_UPLOAD",
        }
    }
}
