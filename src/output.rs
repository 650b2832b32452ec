//! Run report types returned by [`crate::convert::convert`].
//!
//! Everything here is plain data and derives `Serialize` so the CLI can emit
//! it with `--json`.

use crate::config::RunMode;
use crate::pipeline::typeset::TypesetReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub mode: RunMode,

    /// The local PDF that was processed (a temp path for URL inputs).
    pub input: PathBuf,

    /// Extracted text, trimmed.
    pub extracted_text: String,

    /// The file written by this run:
    /// `<build_dir>/<stem><suffix>.tex` in latex mode, `<stem>.txt` in text mode.
    pub artifact: PathBuf,

    /// The model's reply as printed by the engine, before fence stripping.
    pub model_output: String,

    /// Typesetter result; `None` in text mode or when typesetting is off.
    pub typeset: Option<TypesetReport>,

    pub stats: ConversionStats,
}

/// Timing and size figures for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub extracted_chars: usize,
    pub artifact_bytes: usize,
    pub extract_duration_ms: u64,
    pub model_duration_ms: u64,
    pub typeset_duration_ms: u64,
    pub total_duration_ms: u64,
}
