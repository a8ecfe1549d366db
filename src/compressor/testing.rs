//! In-process compressor double for tests

use std::sync::Mutex;

use super::{CompressError, CompressionJob, PdfCompressor};

#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Write the input bytes to the output path and exit 0
    CopyInput,
    /// Exit non-zero with the given diagnostics
    Fail { code: i32, diagnostics: String },
    /// Exit 0 without writing anything
    NoOutput,
    /// Exit 0 after writing an empty output file
    EmptyOutput,
}

#[derive(Debug)]
pub struct FakeCompressor {
    behavior: FakeBehavior,
    jobs: Mutex<Vec<CompressionJob>>,
}

impl FakeCompressor {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(code: i32, diagnostics: &str) -> Self {
        Self::new(FakeBehavior::Fail {
            code,
            diagnostics: diagnostics.to_string(),
        })
    }

    /// Every job this compressor has been handed, in order
    pub fn jobs(&self) -> Vec<CompressionJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PdfCompressor for FakeCompressor {
    async fn compress(&self, job: &CompressionJob) -> Result<(), CompressError> {
        self.jobs.lock().unwrap().push(job.clone());

        match &self.behavior {
            FakeBehavior::CopyInput => {
                tokio::fs::copy(job.input(), job.output())
                    .await
                    .map_err(CompressError::Wait)?;
                Ok(())
            }
            FakeBehavior::Fail { code, diagnostics } => Err(CompressError::Failed {
                code: Some(*code),
                diagnostics: diagnostics.clone(),
            }),
            FakeBehavior::NoOutput => Ok(()),
            FakeBehavior::EmptyOutput => {
                tokio::fs::write(job.output(), b"")
                    .await
                    .map_err(CompressError::Wait)?;
                Ok(())
            }
        }
    }
}
