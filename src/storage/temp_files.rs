//! Request-scoped cleanup guard

use std::path::PathBuf;
#[cfg(test)]
use std::path::Path;

use super::temp_store::{remove, remove_blocking};

/// Files created on behalf of one request.
///
/// Removal happens exactly once: either through [`TempFiles::cleanup`] or,
/// if the owner is dropped first (handler cancelled, response body dropped),
/// from `Drop`.
#[derive(Debug, Default)]
pub struct TempFiles {
    paths: Vec<PathBuf>,
    cleaned: bool,
}

impl TempFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path for removal. It does not need to exist yet.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    #[cfg(test)]
    pub(crate) fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Remove every tracked file that still exists
    pub async fn cleanup(mut self) {
        for path in &self.paths {
            remove(path).await;
        }
        self.cleaned = true;
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        if self.cleaned || self.paths.is_empty() {
            return;
        }

        tracing::debug!(files = self.paths.len(), "Cleaning up temp files on drop");
        for path in &self.paths {
            remove_blocking(path);
        }
    }
}
