//! LibreOffice-backed conversion.

use super::{FormatConverter, OutputFormat};
use crate::error::{FillerError, FillerResult};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Default bound on a single conversion.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs `soffice --headless --convert-to <ext>` in a scratch directory.
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: PathBuf,
    timeout: Duration,
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl SofficeConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn failed(reason: impl Into<String>) -> FillerError {
        let reason = reason.into();
        tracing::warn!(%reason, "conversion failed");
        FillerError::ConversionFailed { reason }
    }

    /// Waits for the child, killing it once the deadline passes.
    fn run(&self, dir: &Path, input: &Path, to: OutputFormat) -> FillerResult<()> {
        let mut child = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg(to.extension())
            .arg("--outdir")
            .arg(dir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Self::failed(format!("cannot start '{}': {}", self.program.display(), e))
            })?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(Self::failed(format!("converter exited with {}", status)))
                }
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Self::failed(format!(
                        "timed out after {}s",
                        self.timeout.as_secs()
                    )));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(Self::failed(format!("cannot wait for converter: {}", e))),
            }
        }
    }
}

impl FormatConverter for SofficeConverter {
    fn convert(&self, bytes: &[u8], from: OutputFormat, to: OutputFormat) -> FillerResult<Vec<u8>> {
        if from == to {
            return Ok(bytes.to_vec());
        }

        let dir = tempfile::tempdir()
            .map_err(|e| Self::failed(format!("cannot create scratch directory: {}", e)))?;
        let input = dir.path().join(format!("input.{}", from.extension()));
        std::fs::write(&input, bytes)
            .map_err(|e| Self::failed(format!("cannot write converter input: {}", e)))?;

        let started = Instant::now();
        self.run(dir.path(), &input, to)?;

        let output = dir.path().join(format!("input.{}", to.extension()));
        let converted = std::fs::read(&output)
            .map_err(|_| Self::failed("converter produced no output"))?;
        if converted.is_empty() {
            return Err(Self::failed("converter produced an empty file"));
        }

        tracing::debug!(
            from = %from,
            to = %to,
            bytes = converted.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "converted document"
        );
        Ok(converted)
    }

    fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "soffice"
    }
}
