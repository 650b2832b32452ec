//! Typesetting: compile the generated artifact inside the build directory.
//!
//! ## No `chdir`
//!
//! `pdflatex` writes its `.aux`, `.log` and `.pdf` into the current directory,
//! so it has to run *inside* the build directory. Instead of changing the
//! process-wide working directory (and having to restore it on every exit
//! path), the child is spawned with its own working directory. The parent's
//! current directory is never modified, whatever the outcome.

use crate::error::Pdf2TexError;
use crate::process::{self, Invocation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Hint shown when the typesetter binary is not on `PATH`.
pub const LATEX_NOT_INSTALLED_HINT: &str =
    "Ensure a LaTeX distribution (e.g., TeX Live or MiKTeX) is installed and added to PATH.";

/// Something that can compile an artifact sitting in a directory.
#[async_trait]
pub trait Typesetter: Send + Sync {
    /// Short engine name for logs and progress output.
    fn name(&self) -> &str;

    /// Compile `build_dir/artifact_name`, running inside `build_dir`.
    async fn typeset(
        &self,
        build_dir: &Path,
        artifact_name: &str,
    ) -> Result<TypesetReport, Pdf2TexError>;
}

/// Successful typesetter run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesetReport {
    pub engine: String,
    /// Everything the engine printed on stdout (the LaTeX transcript).
    pub stdout: String,
    pub duration_ms: u64,
}

/// `pdflatex`-compatible typesetter: `<program> [args…] <artifact>`.
#[derive(Debug, Clone)]
pub struct PdfLatex {
    program: String,
    args: Vec<String>,
}

impl PdfLatex {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the artifact name.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn invocation(&self, build_dir: &Path, artifact_name: &str) -> Invocation {
        Invocation::new(&self.program)
            .args(self.args.iter().cloned())
            .arg(artifact_name)
            .current_dir(build_dir)
    }
}

impl Default for PdfLatex {
    fn default() -> Self {
        Self::new("pdflatex")
    }
}

#[async_trait]
impl Typesetter for PdfLatex {
    fn name(&self) -> &str {
        &self.program
    }

    async fn typeset(
        &self,
        build_dir: &Path,
        artifact_name: &str,
    ) -> Result<TypesetReport, Pdf2TexError> {
        let output =
            process::run(&self.invocation(build_dir, artifact_name), LATEX_NOT_INSTALLED_HINT)
                .await?;

        if !output.success {
            return Err(Pdf2TexError::TypesetFailed {
                engine: self.program.clone(),
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        Ok(TypesetReport {
            engine: self.program.clone(),
            stdout: output.stdout,
            duration_ms: output.duration_ms,
        })
    }
}

/// Compile `artifact_name`, which must already exist in `build_dir`.
///
/// # Errors
/// - [`Pdf2TexError::ArtifactMissing`] before the engine is started
/// - whatever the engine reports (not installed, non-zero exit)
pub async fn build_document(
    typesetter: &dyn Typesetter,
    build_dir: &Path,
    artifact_name: &str,
) -> Result<TypesetReport, Pdf2TexError> {
    if !build_dir.join(artifact_name).is_file() {
        return Err(Pdf2TexError::ArtifactMissing {
            file: artifact_name.to_string(),
            dir: build_dir.to_path_buf(),
        });
    }

    info!(
        "Typesetting {} in {} with {}",
        artifact_name,
        build_dir.display(),
        typesetter.name()
    );

    match typesetter.typeset(build_dir, artifact_name).await {
        Ok(report) => {
            info!("{} ran successfully in {}ms", report.engine, report.duration_ms);
            Ok(report)
        }
        Err(e) => {
            warn!("Typesetting failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn invocation_runs_inside_build_dir() {
        let engine = PdfLatex::default().with_args(["-interaction=nonstopmode"]);
        let inv = engine.invocation(Path::new("build"), "report_SOW.tex");
        assert_eq!(inv.program, "pdflatex");
        assert_eq!(inv.args, vec!["-interaction=nonstopmode", "report_SOW.tex"]);
        assert_eq!(inv.current_dir, Some(PathBuf::from("build")));
        assert!(inv.stdin.is_none());
    }

    #[tokio::test]
    async fn missing_artifact_fails_before_engine() {
        let dir = tempfile::tempdir().unwrap();
        let before = std::env::current_dir().unwrap();

        // The engine does not exist either; the precondition must win.
        let engine = PdfLatex::new("pdf2tex-no-such-latex");
        let err = build_document(&engine, dir.path(), "report_SOW.tex")
            .await
            .unwrap_err();

        assert!(matches!(err, Pdf2TexError::ArtifactMissing { .. }));
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[tokio::test]
    async fn missing_engine_reports_install_hint() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.tex"), "\\relax").unwrap();
        let before = std::env::current_dir().unwrap();

        let engine = PdfLatex::new("pdf2tex-no-such-latex");
        let err = build_document(&engine, dir.path(), "a.tex").await.unwrap_err();

        match err {
            Pdf2TexError::EngineNotFound { hint, .. } => {
                assert!(hint.contains("TeX Live or MiKTeX"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn engine_failure_carries_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.tex"), "\\relax").unwrap();
        let before = std::env::current_dir().unwrap();

        // sh -c '<script>' a.tex  → $0 = a.tex
        let engine = PdfLatex::new("sh").with_args(["-c", "echo 'Undefined control sequence' >&2; exit 1"]);
        let err = build_document(&engine, dir.path(), "a.tex").await.unwrap_err();

        match err {
            Pdf2TexError::TypesetFailed { code, stderr, .. } => {
                assert_eq!(code, Some(1));
                assert!(stderr.contains("Undefined control sequence"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn success_runs_in_build_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.tex"), "\\relax").unwrap();
        let before = std::env::current_dir().unwrap();

        // Proves the child sees the artifact by its bare name.
        let engine = PdfLatex::new("sh").with_args(["-c", "cat \"$0\" && touch \"${0%.tex}.pdf\""]);
        let report = build_document(&engine, dir.path(), "a.tex").await.unwrap();

        assert_eq!(report.engine, "sh");
        assert_eq!(report.stdout, "\\relax");
        assert!(dir.path().join("a.pdf").is_file());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
