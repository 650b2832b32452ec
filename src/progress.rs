//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to be told
//! when each stage starts and finishes. The model stage can take minutes on
//! a CPU-only machine, so the CLI uses these events to keep a spinner alive
//! and print a line per finished stage.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2tex::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_stage_complete(&self, stage: Stage, output_len: usize) {
//!         eprintln!("{stage} done ({output_len} bytes)");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Running the extraction engine.
    Extract,
    /// Writing the extracted text beside the input (text mode).
    SaveText,
    /// Running the model engine (and, in latex mode, writing the artifact).
    Model,
    /// Running the typesetter.
    Typeset,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Extract => "extract",
            Stage::SaveText => "save text",
            Stage::Model => "model",
            Stage::Typeset => "typeset",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Stages run one at a time, but the trait is still
/// `Send + Sync` so a callback can be shared with the Tokio runtime.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called just before a stage starts.
    ///
    /// # Arguments
    /// * `stage`  - the stage about to run
    /// * `engine` - program (or engine label) that will do the work
    fn on_stage_start(&self, stage: Stage, engine: &str) {
        let _ = (stage, engine);
    }

    /// Called when a stage finishes successfully.
    ///
    /// # Arguments
    /// * `stage`      - the stage that finished
    /// * `output_len` - byte length of what the stage produced
    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let _ = (stage, output_len);
    }

    /// Called when a stage fails. Only the typesetter can still start after
    /// this (latex mode, following a failed model stage).
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
