//! Subprocess execution shared by every engine.
//!
//! All three external programs are driven the same way: spawn, optionally
//! feed stdin, wait, collect stdout/stderr. This module owns that mechanism
//! so the engine implementations only decide *what* to run and how to map
//! a non-zero exit onto a [`Pdf2TexError`] variant.
//!
//! ## Why write stdin from a separate task?
//!
//! The model engine may start printing before it has consumed its whole
//! input. If we wrote the full payload first and only then started reading,
//! a payload larger than the pipe buffer (64 KiB on Linux) would deadlock:
//! the child blocks writing stdout, we block writing stdin. Writing from a
//! spawned task while `wait_with_output` drains the other pipes avoids that.

use crate::error::Pdf2TexError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// A fully-specified external program invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Program name resolved on `PATH`, or an explicit path.
    pub program: String,
    pub args: Vec<String>,
    /// Bytes written to the child's stdin. `None` closes stdin immediately.
    pub stdin: Option<Vec<u8>>,
    /// Working directory for the child only; the parent's is never touched.
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(bytes.into());
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code, `None` when the child was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

/// Run `invocation` to completion and capture its output.
///
/// A non-zero exit is **not** an error here: callers inspect
/// [`ProcessOutput::success`] and raise the stage-specific variant.
/// Only failing to start the program is reported as `Err`:
/// [`Pdf2TexError::EngineNotFound`] when the program is not on `PATH`
/// (carrying `not_found_hint`), [`Pdf2TexError::EngineSpawnFailed`] otherwise.
pub async fn run(
    invocation: &Invocation,
    not_found_hint: &str,
) -> Result<ProcessOutput, Pdf2TexError> {
    let start = Instant::now();

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .kill_on_drop(true);
    if let Some(ref dir) = invocation.current_dir {
        cmd.current_dir(dir);
    }

    debug!(
        "Spawning {} {:?} (cwd: {:?})",
        invocation.program, invocation.args, invocation.current_dir
    );

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound => Pdf2TexError::EngineNotFound {
            engine: invocation.program.clone(),
            hint: not_found_hint.to_string(),
        },
        _ => Pdf2TexError::EngineSpawnFailed {
            engine: invocation.program.clone(),
            source: e,
        },
    })?;

    let writer = match (child.stdin.take(), invocation.stdin.clone()) {
        (Some(mut pipe), Some(bytes)) => Some(tokio::spawn(async move {
            let result = pipe.write_all(&bytes).await;
            // Dropping the pipe sends EOF.
            drop(pipe);
            result
        })),
        _ => None,
    };

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| Pdf2TexError::Internal(format!("Failed to wait for {}: {e}", invocation.program)))?;

    if let Some(handle) = writer {
        match handle.await {
            // A broken pipe only means the child exited without reading
            // everything; its exit status tells the real story.
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                warn!("{} closed stdin before reading all input", invocation.program);
            }
            Ok(Err(e)) => {
                return Err(Pdf2TexError::Internal(format!(
                    "Failed to write stdin of {}: {e}",
                    invocation.program
                )))
            }
            Ok(Ok(())) => {}
            Err(e) => {
                return Err(Pdf2TexError::Internal(format!(
                    "stdin writer task panicked: {e}"
                )))
            }
        }
    }

    let result = ProcessOutput {
        code: output.status.code(),
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    debug!(
        "{} exited with {:?} after {}ms ({} bytes stdout)",
        invocation.program,
        result.code,
        result.duration_ms,
        result.stdout.len()
    );

    Ok(result)
}
