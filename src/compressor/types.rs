//! Compression job and result types

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

// ============================================================================
// Compression Job
// ============================================================================

/// One input/output pairing handed to a single compressor invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionJob {
    input: PathBuf,
    output: PathBuf,
}

impl CompressionJob {
    /// Check the job preconditions against the filesystem.
    ///
    /// The input must be an existing, non-empty file and the output must not
    /// exist yet.
    pub async fn prepare(input: PathBuf, output: PathBuf) -> io::Result<Self> {
        let metadata = tokio::fs::metadata(&input).await?;
        if !metadata.is_file() || metadata.len() == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "compression input is empty or not a regular file",
            ));
        }

        if tokio::fs::try_exists(&output).await? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "compression output already exists",
            ));
        }

        Ok(Self { input, output })
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

// ============================================================================
// Subprocess Outcome
// ============================================================================

/// Exit status and everything the subprocess printed
#[derive(Debug)]
pub struct SubprocessOutcome {
    pub status: ExitStatus,
    pub diagnostics: String,
}

impl SubprocessOutcome {
    /// Exit code 0 is success no matter what was printed
    pub fn into_result(self) -> Result<(), CompressError> {
        if self.status.success() {
            Ok(())
        } else {
            Err(CompressError::Failed {
                code: self.status.code(),
                diagnostics: self.diagnostics,
            })
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("Failed to launch compressor: {0}")]
    Launch(#[source] io::Error),

    #[error("Compression failed with {}", failure_detail(.code, .diagnostics))]
    Failed {
        code: Option<i32>,
        diagnostics: String,
    },

    #[error("Compression failed: no output produced")]
    NoOutput,

    #[error("Compression timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Failed to wait for compressor: {0}")]
    Wait(#[source] io::Error),
}

impl CompressError {
    /// Replace each `(needle, label)` occurrence in captured diagnostics so
    /// server paths never reach a client
    pub fn redact(self, replacements: &[(&Path, &str)]) -> Self {
        match self {
            CompressError::Failed { code, mut diagnostics } => {
                for (path, label) in replacements {
                    let needle = path.to_string_lossy();
                    if !needle.is_empty() {
                        diagnostics = diagnostics.replace(needle.as_ref(), label);
                    }
                }
                CompressError::Failed { code, diagnostics }
            }
            other => other,
        }
    }
}

fn failure_detail(code: &Option<i32>, diagnostics: &str) -> String {
    let status = match code {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    };

    let diagnostics = diagnostics.trim();
    if diagnostics.is_empty() {
        status
    } else {
        format!("{}: {}", status, diagnostics)
    }
}
