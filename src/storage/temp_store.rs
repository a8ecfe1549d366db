//! Upload directory management

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

/// Create `path` (and parents) as a directory if it does not exist yet.
///
/// Fails if the path exists but is not a directory.
pub async fn ensure_directory(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists and is not a directory", path.display()),
            ))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    tokio::fs::create_dir_all(path).await
}

/// Existence check that never fails
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Best-effort delete. Missing files are fine; other failures are logged.
pub async fn remove(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed temp file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp file"),
    }
}

/// Blocking variant of [`remove`] for use from `Drop`
pub(crate) fn remove_blocking(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed temp file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp file"),
    }
}

/// Handle to the process-wide upload directory
#[derive(Clone, Debug)]
pub struct TempFileStore {
    root: Arc<PathBuf>,
}

impl TempFileStore {
    /// Ensure the directory exists and resolve it to an absolute path
    pub async fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        ensure_directory(dir).await?;
        let root = tokio::fs::canonicalize(dir).await?;

        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh extension-less path for an incoming upload.
    ///
    /// The name is a random UUID, never anything the client sent.
    pub fn allocate_upload(&self) -> (Uuid, PathBuf) {
        let id = Uuid::new_v4();
        (id, self.root.join(id.to_string()))
    }

    /// Path the upload is renamed to before compression
    pub fn normalized_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{}.pdf", id))
    }

    /// Path the compressor writes to
    pub fn output_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("compressed_{}.pdf", id))
    }
}
