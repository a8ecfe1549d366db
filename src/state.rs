//! Application state management

use std::path::PathBuf;
use std::sync::Arc;

use crate::compressor::PdfCompressor;
use crate::config::Config;
use crate::storage::TempFileStore;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to prepare upload directory {path}: {source}")]
    UploadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: TempFileStore,
    compressor: Arc<dyn PdfCompressor>,
}

impl AppState {
    /// Create a new application state
    ///
    /// Creates the upload directory if needed.
    pub async fn new(config: Config, compressor: Arc<dyn PdfCompressor>) -> Result<Self, StateError> {
        let store = TempFileStore::open(&config.storage.upload_dir)
            .await
            .map_err(|source| StateError::UploadDir {
                path: config.storage.upload_dir.clone(),
                source,
            })?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                compressor,
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the upload directory handle
    pub fn store(&self) -> &TempFileStore {
        &self.inner.store
    }

    /// Get the compressor
    pub fn compressor(&self) -> &dyn PdfCompressor {
        self.inner.compressor.as_ref()
    }
}
