//! Ghostscript subprocess invoker

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};

use super::types::{CompressError, CompressionJob, SubprocessOutcome};
use super::PdfCompressor;
use crate::config::{CompressorConfig, PdfPreset};

/// Runs `gs -sDEVICE=pdfwrite ...` for each job
#[derive(Debug, Clone)]
pub struct GhostscriptCompressor {
    binary: PathBuf,
    preset: PdfPreset,
    compatibility_level: String,
    timeout: Duration,
}

impl GhostscriptCompressor {
    pub fn new(
        binary: impl Into<PathBuf>,
        preset: PdfPreset,
        compatibility_level: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            binary: binary.into(),
            preset,
            compatibility_level: compatibility_level.into(),
            timeout,
        }
    }

    pub fn from_config(config: &CompressorConfig) -> Self {
        Self::new(
            config.binary.clone(),
            config.preset,
            config.compatibility_level.clone(),
            config.timeout(),
        )
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Full argument list: fixed flags, then output, then input last
    pub fn arguments(&self, job: &CompressionJob) -> Vec<OsString> {
        let mut output_arg = OsString::from("-sOutputFile=");
        output_arg.push(escape_output_path(job.output()));

        vec![
            OsString::from("-sDEVICE=pdfwrite"),
            OsString::from(format!("-dCompatibilityLevel={}", self.compatibility_level)),
            OsString::from(format!("-dPDFSETTINGS=/{}", self.preset)),
            OsString::from("-dNOPAUSE"),
            OsString::from("-dQUIET"),
            OsString::from("-dBATCH"),
            output_arg,
            job.input().as_os_str().to_owned(),
        ]
    }

    /// Ask the binary for its version string
    pub async fn version(&self) -> Result<String, CompressError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| CompressError::TimedOut(self.timeout))?
            .map_err(CompressError::Launch)?;

        SubprocessOutcome {
            status: output.status,
            diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into_result()?;

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Spawn Ghostscript and wait for it, bounded by the configured timeout
    pub async fn run(&self, job: &CompressionJob) -> Result<SubprocessOutcome, CompressError> {
        let mut child = Command::new(&self.binary)
            .args(self.arguments(job))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!(binary = %self.binary.display(), error = %e, "Failed to launch Ghostscript");
                CompressError::Launch(e)
            })?;

        let pid = child.id();
        let started = Instant::now();
        tracing::debug!(pid = ?pid, preset = %self.preset, "Ghostscript started");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let waited = tokio::time::timeout(self.timeout, async {
            let (diagnostics, status) =
                tokio::join!(collect_diagnostics(stdout, stderr), child.wait());
            status.map(|status| SubprocessOutcome {
                status,
                diagnostics,
            })
        })
        .await;

        match waited {
            Ok(Ok(outcome)) => {
                tracing::debug!(
                    pid = ?pid,
                    exit_code = ?outcome.status.code(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Ghostscript finished"
                );
                Ok(outcome)
            }
            Ok(Err(e)) => Err(CompressError::Wait(e)),
            Err(_) => {
                tracing::warn!(
                    pid = ?pid,
                    timeout_secs = self.timeout.as_secs(),
                    "Ghostscript timed out, killing"
                );
                if let Err(e) = child.kill().await {
                    tracing::warn!(pid = ?pid, error = %e, "Failed to kill Ghostscript");
                }
                Err(CompressError::TimedOut(self.timeout))
            }
        }
    }
}

#[async_trait::async_trait]
impl PdfCompressor for GhostscriptCompressor {
    async fn compress(&self, job: &CompressionJob) -> Result<(), CompressError> {
        self.run(job).await?.into_result()
    }
}

/// Ghostscript treats `%` in `-sOutputFile` as a page-number template
fn escape_output_path(path: &Path) -> OsString {
    match path.to_str() {
        Some(s) if s.contains('%') => OsString::from(s.replace('%', "%%")),
        _ => path.as_os_str().to_owned(),
    }
}

async fn collect_diagnostics(stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) -> String {
    let (stderr_text, stdout_text) =
        tokio::join!(drain_lines(stderr, "stderr"), drain_lines(stdout, "stdout"));

    let mut diagnostics = stderr_text;
    diagnostics.push_str(&stdout_text);
    diagnostics
}

async fn drain_lines<R>(reader: Option<R>, stream: &'static str) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return String::new();
    };

    let mut reader = BufReader::new(reader);
    let mut collected = String::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                let text = text.trim_end();
                if !text.is_empty() {
                    tracing::debug!(stream, line = %text, "Ghostscript output");
                    collected.push_str(text);
                    collected.push('\n');
                }
            }
            Err(e) => {
                tracing::warn!(stream, error = %e, "Failed to read Ghostscript output");
                break;
            }
        }
    }

    collected
}
