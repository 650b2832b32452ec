//! Configuration types for PDF-to-LaTeX conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults reproduce the classic
//! invocation: `pdftotext <pdf> -` → `ollama run pdf` → `pdflatex` inside
//! `build/`, writing `build/<stem>_SOW.tex`.
//!
//! Engines are named by program so they can be swapped for a different
//! binary on `PATH` (e.g. `lualatex`), or replaced outright with a
//! pre-built [`TextExtractor`] / [`ModelEngine`] / [`Typesetter`]. The
//! tests use the latter to drive the pipeline without external tools.

use crate::error::Pdf2TexError;
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::model::ModelEngine;
use crate::pipeline::typeset::Typesetter;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2tex::{ConversionConfig, RunMode};
///
/// let config = ConversionConfig::builder()
///     .mode(RunMode::Latex)
///     .model("llama3.1")
///     .typesetter_program("lualatex")
///     .build_dir("out")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Which product to produce. Default: [`RunMode::Latex`].
    pub mode: RunMode,

    /// Text-extraction program. Default: `pdftotext`.
    pub extractor_program: String,

    /// Language-model CLI. Invoked as `<program> run <model>`. Default: `ollama`.
    pub model_program: String,

    /// Model identifier passed to the model CLI. Default: `pdf`.
    pub model: String,

    /// Typesetting program. Default: `pdflatex`.
    pub typesetter_program: String,

    /// Extra arguments placed before the artifact name, e.g.
    /// `-interaction=nonstopmode`. Default: none.
    pub typesetter_args: Vec<String>,

    /// Directory holding the generated artifact and the typesetter's
    /// byproducts. Created on demand. Default: `build`.
    pub build_dir: PathBuf,

    /// Appended to the input's file stem to name the artifact. Default: `_SOW`.
    pub artifact_suffix: String,

    /// Language tags whose opening fence (`` ```<tag> ``) is stripped from
    /// the model output. Bare `` ``` `` markers are always stripped.
    /// Default: `["latex"]`.
    pub fence_tags: Vec<String>,

    /// Run the typesetter after writing the artifact (latex mode). Default: true.
    pub typeset: bool,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Pre-constructed extractor. Takes precedence over `extractor_program`.
    pub extractor: Option<Arc<dyn TextExtractor>>,

    /// Pre-constructed model engine. Takes precedence over `model_program`.
    pub model_engine: Option<Arc<dyn ModelEngine>>,

    /// Pre-constructed typesetter. Takes precedence over `typesetter_program`.
    pub typesetter: Option<Arc<dyn Typesetter>>,

    /// Stage event sink. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            extractor_program: "pdftotext".to_string(),
            model_program: "ollama".to_string(),
            model: "pdf".to_string(),
            typesetter_program: "pdflatex".to_string(),
            typesetter_args: Vec::new(),
            build_dir: PathBuf::from("build"),
            artifact_suffix: "_SOW".to_string(),
            fence_tags: vec!["latex".to_string()],
            typeset: true,
            download_timeout_secs: 120,
            extractor: None,
            model_engine: None,
            typesetter: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("mode", &self.mode)
            .field("extractor_program", &self.extractor_program)
            .field("model_program", &self.model_program)
            .field("model", &self.model)
            .field("typesetter_program", &self.typesetter_program)
            .field("typesetter_args", &self.typesetter_args)
            .field("build_dir", &self.build_dir)
            .field("artifact_suffix", &self.artifact_suffix)
            .field("fence_tags", &self.fence_tags)
            .field("typeset", &self.typeset)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("extractor", &self.extractor.as_ref().map(|e| e.name().to_string()))
            .field("model_engine", &self.model_engine.as_ref().map(|m| m.name().to_string()))
            .field("typesetter", &self.typesetter.as_ref().map(|t| t.name().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn mode(mut self, mode: RunMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn extractor_program(mut self, program: impl Into<String>) -> Self {
        self.config.extractor_program = program.into();
        self
    }

    pub fn model_program(mut self, program: impl Into<String>) -> Self {
        self.config.model_program = program.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn typesetter_program(mut self, program: impl Into<String>) -> Self {
        self.config.typesetter_program = program.into();
        self
    }

    pub fn typesetter_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.typesetter_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.build_dir = dir.into();
        self
    }

    pub fn artifact_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.artifact_suffix = suffix.into();
        self
    }

    pub fn fence_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.fence_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn typeset(mut self, v: bool) -> Self {
        self.config.typeset = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn model_engine(mut self, engine: Arc<dyn ModelEngine>) -> Self {
        self.config.model_engine = Some(engine);
        self
    }

    pub fn typesetter(mut self, typesetter: Arc<dyn Typesetter>) -> Self {
        self.config.typesetter = Some(typesetter);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2TexError> {
        let c = &self.config;
        for (what, value) in [
            ("extractor program", &c.extractor_program),
            ("model program", &c.model_program),
            ("model name", &c.model),
            ("typesetter program", &c.typesetter_program),
        ] {
            if value.trim().is_empty() {
                return Err(Pdf2TexError::InvalidConfig(format!(
                    "{what} must not be empty"
                )));
            }
        }
        if c.artifact_suffix.contains(['/', '\\']) {
            return Err(Pdf2TexError::InvalidConfig(format!(
                "artifact suffix must not contain path separators, got '{}'",
                c.artifact_suffix
            )));
        }
        if c.fence_tags.iter().any(|t| t.trim().is_empty()) {
            return Err(Pdf2TexError::InvalidConfig(
                "fence tags must not be empty strings".into(),
            ));
        }
        if c.build_dir.as_os_str().is_empty() {
            return Err(Pdf2TexError::InvalidConfig(
                "build directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The two products this tool can make from a PDF.
///
/// | Mode | Writes | Then |
/// |------|--------|------|
/// | `Latex` | `<build_dir>/<stem><suffix>.tex` (model output, fences stripped) | runs the typesetter |
/// | `Text`  | `<stem>.txt` beside the input (raw extracted text) | prints the model's reply |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Generate LaTeX with the model and compile it. (default)
    #[default]
    Latex,
    /// Save the extracted text and show the model's reply.
    Text,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Latex => f.write_str("latex"),
            RunMode::Text => f.write_str("text"),
        }
    }
}
