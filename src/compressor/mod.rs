//! PDF Compressor
//!
//! Wraps the external Ghostscript binary. The actual PDF rewriting happens in
//! the subprocess; this module builds the invocation, collects diagnostics and
//! turns the exit status into a `Result`.

pub mod ghostscript;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use ghostscript::GhostscriptCompressor;
pub use types::{CompressError, CompressionJob, SubprocessOutcome};

/// Anything that can turn `job.input()` into a smaller `job.output()`
#[async_trait::async_trait]
pub trait PdfCompressor: Send + Sync {
    /// Run one job to completion. Does not check that the output was written.
    async fn compress(&self, job: &CompressionJob) -> Result<(), CompressError>;
}
