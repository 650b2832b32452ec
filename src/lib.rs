//! # edgequake-pdf2tex
//!
//! Convert PDF documents to LaTeX with a locally-running language model.
//!
//! ## Why this crate?
//!
//! Retyping a statement of work or a scanned-then-OCR'd report into LaTeX is
//! tedious. Text extraction is a solved problem (`pdftotext`), a local model
//! served by Ollama is good at re-structuring plain text into LaTeX markup,
//! and `pdflatex` tells you immediately whether the result compiles. This
//! crate wires the three together, cleans up the model's habit of wrapping
//! its answer in Markdown code fences, and keeps the generated files in one
//! predictable place.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2. Extract  pdftotext <pdf> -
//!  ├─ 3. Model    ollama run pdf  (text on stdin)
//!  ├─ 4. Polish   strip ```latex / ``` fence markers
//!  ├─ 5. Write    build/<stem>_SOW.tex
//!  └─ 6. Compile  pdflatex <stem>_SOW.tex  (inside build/)
//! ```
//!
//! In [`RunMode::Text`] steps 4–6 are replaced by writing the raw extracted
//! text to `<stem>.txt` next to the input and returning the model's reply
//! for inspection.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2tex::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("report.pdf", &config).await?;
//!     println!("wrote {}", output.artifact.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Swapping engines
//!
//! Each external program sits behind a trait ([`TextExtractor`],
//! [`ModelEngine`], [`Typesetter`]). Pass your own implementation through
//! the config builder to use a different backend, or an in-memory fake in
//! tests.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2tex` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, RunMode};
pub use convert::{convert, convert_sync};
pub use error::Pdf2TexError;
pub use output::{ConversionOutput, ConversionStats};
pub use pipeline::extract::{PdfToText, TextExtractor};
pub use pipeline::model::{ModelEngine, OllamaCli};
pub use pipeline::typeset::{PdfLatex, TypesetReport, Typesetter};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
