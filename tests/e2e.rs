//! End-to-end tests against the real external programs.
//!
//! These run `pdftotext`, `pdflatex` and `ollama` for real. They are gated
//! behind the `E2E_ENABLED` environment variable and each one also skips
//! when the program it needs is not on `PATH`.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! The full conversion test additionally needs the model named by
//! `PDF2TEX_MODEL` (default `pdf`) to be present in the local Ollama.

use async_trait::async_trait;
use edgequake_pdf2tex::pipeline::{extract, typeset};
use edgequake_pdf2tex::{
    convert, convert_sync, ConversionConfig, ModelEngine, Pdf2TexError, PdfLatex, PdfToText,
    RunMode,
};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set and `$program` runs.
macro_rules! e2e_skip_unless_ready {
    ($program:expr, $version_flag:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if !program_available($program, $version_flag) {
            println!("SKIP: {} not found on PATH", $program);
            return;
        }
    }};
}

fn program_available(program: &str, version_flag: &str) -> bool {
    Command::new(program)
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// A one-page PDF showing `text` in Helvetica, with a correct xref table.
fn minimal_pdf(text: &str) -> Vec<u8> {
    let stream = format!("BT /F1 24 Tf 72 700 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref_at = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        pdf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

fn write_pdf(dir: &Path, name: &str, text: &str) -> PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, minimal_pdf(text)).unwrap();
    p
}

/// Stands in for the model in text-mode runs so only pdftotext is real.
struct Shout;

#[async_trait]
impl ModelEngine for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    async fn generate(&self, input: &str) -> Result<String, Pdf2TexError> {
        Ok(input.to_uppercase())
    }
}

// ── Ungated ──────────────────────────────────────────────────────────────────

#[test]
fn test_convert_sync_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.pdf");
    let config = ConversionConfig::builder()
        .build_dir(dir.path().join("build"))
        .build()
        .unwrap();

    let err = convert_sync(missing.to_str().unwrap(), &config).unwrap_err();

    assert!(err.is_input_error());
    assert!(!dir.path().join("build").exists());
}

#[test]
fn test_minimal_pdf_has_magic() {
    assert!(minimal_pdf("x").starts_with(b"%PDF-"));
}

// ── pdftotext ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pdftotext_extracts_text() {
    e2e_skip_unless_ready!("pdftotext", "-v");
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "hello.pdf", "Hello World");

    let text = extract::extract_text(&PdfToText::default(), &pdf)
        .await
        .expect("pdftotext should read the generated PDF");

    assert_eq!(text, "Hello World");
}

#[tokio::test]
async fn test_text_mode_with_pdftotext() {
    e2e_skip_unless_ready!("pdftotext", "-v");
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", "abc");
    let config = ConversionConfig::builder()
        .mode(RunMode::Text)
        .build_dir(dir.path().join("build"))
        .model_engine(std::sync::Arc::new(Shout))
        .build()
        .unwrap();

    let out = convert(pdf.to_str().unwrap(), &config).await.unwrap();

    assert_eq!(std::fs::read_to_string(dir.path().join("doc.txt")).unwrap(), "abc");
    assert_eq!(out.model_output, "ABC");
    assert!(!dir.path().join("build").exists());
}

// ── pdflatex ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pdflatex_builds_document() {
    e2e_skip_unless_ready!("pdflatex", "--version");
    let dir = tempfile::tempdir().unwrap();
    let build = dir.path().join("build");
    std::fs::create_dir_all(&build).unwrap();
    std::fs::write(
        build.join("report_SOW.tex"),
        "\\documentclass{article}\n\\begin{document}\n\\section{Hi}\n\\end{document}\n",
    )
    .unwrap();
    let cwd = std::env::current_dir().unwrap();

    let engine = PdfLatex::default().with_args(["-interaction=nonstopmode"]);
    typeset::build_document(&engine, &build, "report_SOW.tex")
        .await
        .expect("pdflatex should compile a trivial document");

    assert!(build.join("report_SOW.pdf").is_file());
    assert_eq!(std::env::current_dir().unwrap(), cwd);
}

#[tokio::test]
async fn test_pdflatex_reports_broken_document() {
    e2e_skip_unless_ready!("pdflatex", "--version");
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("broken.tex"),
        "\\documentclass{article}\n\\begin{document}\n\\nosuchmacro\n\\end{document}\n",
    )
    .unwrap();

    let engine = PdfLatex::default().with_args(["-interaction=nonstopmode", "-halt-on-error"]);
    let err = typeset::build_document(&engine, dir.path(), "broken.tex")
        .await
        .unwrap_err();

    match err {
        Pdf2TexError::TypesetFailed { code, stdout, .. } => {
            assert_ne!(code, Some(0));
            assert!(stdout.contains("Undefined control sequence"), "{stdout}");
        }
        other => panic!("expected TypesetFailed, got {other}"),
    }
}

// ── Full run with Ollama ─────────────────────────────────────────────────────

/// Requires E2E_ENABLED=1, pdftotext, pdflatex and a running Ollama.
#[tokio::test]
async fn test_full_latex_conversion() {
    e2e_skip_unless_ready!("pdftotext", "-v");
    e2e_skip_unless_ready!("ollama", "--version");
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "report.pdf", "Statement of Work");
    let model = std::env::var("PDF2TEX_MODEL").unwrap_or_else(|_| "pdf".to_string());
    let config = ConversionConfig::builder()
        .model(model)
        .build_dir(dir.path().join("build"))
        .typeset(program_available("pdflatex", "--version"))
        .typesetter_args(["-interaction=nonstopmode"])
        .build()
        .unwrap();

    let out = match convert(pdf.to_str().unwrap(), &config).await {
        Ok(out) => out,
        Err(e @ Pdf2TexError::ModelFailed { .. }) => {
            println!("SKIP: model unavailable: {e}");
            return;
        }
        // The model may well produce LaTeX that does not compile.
        Err(Pdf2TexError::TypesetFailed { .. }) => {
            let tex = dir.path().join("build/report_SOW.tex");
            assert!(tex.is_file());
            return;
        }
        Err(e) => panic!("conversion failed: {e}"),
    };

    let tex = std::fs::read_to_string(&out.artifact).unwrap();
    assert!(!tex.contains("```"), "fences must be stripped:\n{tex}");
    assert_eq!(out.artifact, dir.path().join("build/report_SOW.tex"));
}
