//! Model interaction: send extracted text to a local language-model CLI.
//!
//! The default engine is `ollama run <model>`. The whole document goes in on
//! stdin in one request and the reply is read from stdout once the process
//! exits; there is no streaming and no retry. The model named `pdf` is
//! expected to be a custom Ollama model whose Modelfile carries the
//! "convert this text to a LaTeX document" system prompt, so no prompt is
//! added here.

use crate::error::Pdf2TexError;
use crate::pipeline::postprocess::strip_fences;
use crate::process::{self, Invocation};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

/// Something that can turn a text payload into generated output.
#[async_trait]
pub trait ModelEngine: Send + Sync {
    /// Short engine name for logs and progress output.
    fn name(&self) -> &str;

    /// Run one completion over `input` and return the raw reply.
    async fn generate(&self, input: &str) -> Result<String, Pdf2TexError>;
}

/// Ollama-compatible CLI engine: `<program> run <model>`, prompt on stdin.
#[derive(Debug, Clone)]
pub struct OllamaCli {
    program: String,
    model: String,
    label: String,
}

impl OllamaCli {
    pub fn new(program: impl Into<String>, model: impl Into<String>) -> Self {
        let program = program.into();
        let model = model.into();
        let label = format!("{program}:{model}");
        Self {
            program,
            model,
            label,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn invocation(&self, input: &str) -> Invocation {
        Invocation::new(&self.program)
            .args(["run", self.model.as_str()])
            .stdin(input)
    }
}

#[async_trait]
impl ModelEngine for OllamaCli {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(&self, input: &str) -> Result<String, Pdf2TexError> {
        let output = process::run(
            &self.invocation(input),
            "Install Ollama from https://ollama.com and make sure `ollama` is on PATH, \
             or point --llm-cli at another program.",
        )
        .await?;

        if !output.success {
            return Err(Pdf2TexError::ModelFailed {
                engine: self.program.clone(),
                model: self.model.clone(),
                code: output.code,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }
}

/// Result of the model stage in latex mode.
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    /// Reply exactly as the engine printed it.
    pub raw: String,
    /// Reply with fence markers stripped; this is what was written.
    pub cleaned: String,
}

/// Ask the model for a reply to `text`, without writing anything.
pub async fn generate(engine: &dyn ModelEngine, text: &str) -> Result<String, Pdf2TexError> {
    info!("Running model {} on {} chars", engine.name(), text.chars().count());
    let reply = engine.generate(text).await?;
    debug!("Model replied with {} chars", reply.chars().count());
    Ok(reply)
}

/// Generate, strip fences, and persist to `artifact_path`.
///
/// The artifact is written only after the engine succeeded, so a failed
/// model call never leaves a half-baked `.tex` behind (nor clobbers the one
/// from a previous run). The parent directory is created if missing.
pub async fn convert_to_artifact<S: AsRef<str>>(
    engine: &dyn ModelEngine,
    text: &str,
    fence_tags: &[S],
    artifact_path: &Path,
) -> Result<GeneratedArtifact, Pdf2TexError> {
    let raw = generate(engine, text).await?;
    let cleaned = strip_fences(&raw, fence_tags);

    crate::convert::write_atomic(artifact_path, &cleaned).await?;
    info!("Wrote {}", artifact_path.display());

    Ok(GeneratedArtifact { raw, cleaned })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ModelEngine for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        async fn generate(&self, _input: &str) -> Result<String, Pdf2TexError> {
            Ok("```latex\n\\section{Hi}\n```".to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl ModelEngine for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        async fn generate(&self, _input: &str) -> Result<String, Pdf2TexError> {
            Err(Pdf2TexError::ModelFailed {
                engine: "ollama".into(),
                model: "pdf".into(),
                code: Some(1),
                stderr: "pull model first".into(),
            })
        }
    }

    #[test]
    fn invocation_pipes_text() {
        let engine = OllamaCli::new("ollama", "pdf");
        let inv = engine.invocation("Hello World");
        assert_eq!(inv.program, "ollama");
        assert_eq!(inv.args, vec!["run", "pdf"]);
        assert_eq!(inv.stdin.as_deref(), Some(&b"Hello World"[..]));
        assert_eq!(engine.name(), "ollama:pdf");
        assert_eq!(engine.model(), "pdf");
    }

    #[tokio::test]
    async fn artifact_written_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build").join("report_SOW.tex");

        let out = convert_to_artifact(&Echo, "Hello World", &["latex"], &path)
            .await
            .unwrap();

        assert_eq!(out.raw, "```latex\n\\section{Hi}\n```");
        assert_eq!(out.cleaned, "\\section{Hi}\n");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "\\section{Hi}\n");
    }

    #[tokio::test]
    async fn failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        let path = build.join("report_SOW.tex");

        let err = convert_to_artifact(&Broken, "Hello", &["latex"], &path)
            .await
            .unwrap_err();

        assert!(matches!(err, Pdf2TexError::ModelFailed { .. }));
        assert!(!path.exists());
        assert!(!build.exists());
    }

    #[tokio::test]
    async fn missing_cli_is_engine_not_found() {
        let engine = OllamaCli::new("pdf2tex-no-such-ollama", "pdf");
        let err = engine.generate("x").await.unwrap_err();
        assert!(matches!(err, Pdf2TexError::EngineNotFound { .. }));
    }
}
