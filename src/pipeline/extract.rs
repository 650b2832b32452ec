//! Text extraction: PDF → plain text via an external engine.
//!
//! The default engine is poppler's `pdftotext`, invoked as
//! `pdftotext <input> -` so the text arrives on stdout and nothing is written
//! next to the input. No `-layout`: the model re-flows the text itself.

use crate::error::Pdf2TexError;
use crate::process::{self, Invocation};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Something that can turn a PDF into text.
///
/// Implementations return the engine's raw output; trimming and the
/// emptiness check happen in [`extract_text`] so every engine gets them.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Short engine name for logs and progress output.
    fn name(&self) -> &str;

    /// Extract all text from the document at `pdf_path`.
    async fn extract(&self, pdf_path: &Path) -> Result<String, Pdf2TexError>;
}

/// `pdftotext`-compatible extractor: `<program> <input> -`.
#[derive(Debug, Clone)]
pub struct PdfToText {
    program: String,
}

impl PdfToText {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn invocation(&self, pdf_path: &Path) -> Invocation {
        Invocation::new(&self.program)
            .arg(pdf_path.to_string_lossy())
            .arg("-")
    }
}

impl Default for PdfToText {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

#[async_trait]
impl TextExtractor for PdfToText {
    fn name(&self) -> &str {
        &self.program
    }

    async fn extract(&self, pdf_path: &Path) -> Result<String, Pdf2TexError> {
        let output = process::run(
            &self.invocation(pdf_path),
            "Install poppler-utils (apt install poppler-utils / brew install poppler) \
             or point --extractor at a pdftotext-compatible program.",
        )
        .await?;

        if !output.success {
            return Err(Pdf2TexError::ExtractionFailed {
                engine: self.program.clone(),
                code: output.code,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }
}

/// Run `extractor` on `pdf_path` and return the trimmed text.
///
/// # Errors
/// - whatever the engine reports (not found, non-zero exit)
/// - [`Pdf2TexError::NoTextExtracted`] when the trimmed text is empty, so
///   no downstream stage ever runs on nothing
pub async fn extract_text(
    extractor: &dyn TextExtractor,
    pdf_path: &Path,
) -> Result<String, Pdf2TexError> {
    info!("Extracting text from {} with {}", pdf_path.display(), extractor.name());

    let raw = extractor.extract(pdf_path).await?;
    let text = raw.trim();
    if text.is_empty() {
        return Err(Pdf2TexError::NoTextExtracted {
            path: PathBuf::from(pdf_path),
        });
    }

    debug!("Extracted {} chars", text.chars().count());
    Ok(text.to_string())
}
