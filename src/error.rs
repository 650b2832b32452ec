//! Error types for the edgequake-pdf2tex library.
//!
//! Every stage of the pipeline reports failure through [`Pdf2TexError`].
//! There are no sentinel values: an empty extraction is its own variant
//! ([`Pdf2TexError::NoTextExtracted`]) rather than an empty string that the
//! caller has to interpret.
//!
//! Variants are grouped by the stage that raises them so the CLI can map a
//! failure back to "which program do I need to fix?" at a glance.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-pdf2tex library.
#[derive(Debug, Error)]
pub enum Pdf2TexError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("The file '{path}' does not exist.\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Engine errors (any stage) ─────────────────────────────────────────
    /// The external program could not be found on the search path.
    #[error("'{engine}' not found. {hint}")]
    EngineNotFound { engine: String, hint: String },

    /// The external program exists but could not be started.
    #[error("Failed to start '{engine}': {source}")]
    EngineSpawnFailed {
        engine: String,
        #[source]
        source: std::io::Error,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The extraction engine exited with a non-zero status.
    #[error("Error running {engine} (exit code {code:?}):\n{stderr}")]
    ExtractionFailed {
        engine: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The extraction engine succeeded but produced no text.
    #[error("No text extracted from '{path}'.\nThe PDF may be scanned images only; OCR it first.")]
    NoTextExtracted { path: PathBuf },

    // ── Model errors ──────────────────────────────────────────────────────
    /// The language-model engine exited with a non-zero status.
    #[error("Error running {engine} with model '{model}' (exit code {code:?}):\n{stderr}")]
    ModelFailed {
        engine: String,
        model: String,
        code: Option<i32>,
        stderr: String,
    },

    // ── Typesetting errors ────────────────────────────────────────────────
    /// The artifact the typesetter should compile is not in the build directory.
    #[error("The file {file} does not exist in {}!", .dir.display())]
    ArtifactMissing { file: String, dir: PathBuf },

    /// The typesetting engine exited with a non-zero status.
    #[error("Error running {engine}:\nReturn code: {code:?}\nError output: {stderr}")]
    TypesetFailed {
        engine: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the build directory.
    #[error("Failed to create build directory '{path}': {source}")]
    BuildDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2TexError {
    /// True for errors detected before any external program ran.
    ///
    /// Input errors never leave anything behind on disk.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Pdf2TexError::FileNotFound { .. }
                | Pdf2TexError::PermissionDenied { .. }
                | Pdf2TexError::InvalidInput { .. }
                | Pdf2TexError::DownloadFailed { .. }
                | Pdf2TexError::DownloadTimeout { .. }
                | Pdf2TexError::NotAPdf { .. }
        )
    }
}
