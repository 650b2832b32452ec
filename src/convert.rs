//! Conversion entry points: drive the stages in order for either run mode.
//!
//! ```text
//! latex:  resolve ─▶ extract ─▶ model + write build/<stem>_SOW.tex ─▶ typeset
//! text:   resolve ─▶ extract ─▶ write <stem>.txt ─▶ model (reply returned)
//! ```
//!
//! Each stage either hands its output to the next or returns `Err`, which
//! ends the run: a failed extraction never reaches the model. The one
//! exception is a failed model call in latex mode, after which the
//! typesetter still runs on whatever the build directory already holds.
//! Input problems are detected before any engine runs or any directory is
//! created.

use crate::config::{ConversionConfig, RunMode};
use crate::error::Pdf2TexError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::extract::{self, PdfToText, TextExtractor};
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::model::{self, ModelEngine, OllamaCli};
use crate::pipeline::typeset::{self, PdfLatex, Typesetter};
use crate::progress::Stage;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a PDF file or URL according to `config.mode`.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` - Local file path or HTTP/HTTPS URL to a PDF
/// * `config` - Conversion configuration
///
/// # Errors
/// The first failing stage's error, see [`Pdf2TexError`]. Files written by
/// earlier stages are left in place (e.g. the `.tex` when only the
/// typesetter failed).
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2TexError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting {} conversion: {}", config.mode, input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();
    let artifact = artifact_path(&resolved, config);
    if artifact == pdf_path {
        return Err(Pdf2TexError::InvalidInput {
            input: format!("{input_str} (output would overwrite the input)"),
        });
    }
    debug!("Artifact path: {}", artifact.display());

    // ── Step 2: Get/create engines ───────────────────────────────────────
    let engines = Engines::resolve(config);

    // ── Step 3: Extract text ─────────────────────────────────────────────
    let extract_start = Instant::now();
    let text = run_stage(
        config,
        Stage::Extract,
        engines.extractor.name(),
        extract::extract_text(engines.extractor.as_ref(), &pdf_path),
        |t: &String| t.len(),
    )
    .await?;
    let mut stats = ConversionStats {
        extracted_chars: text.chars().count(),
        extract_duration_ms: extract_start.elapsed().as_millis() as u64,
        ..Default::default()
    };

    // ── Step 4: Mode-specific stages ─────────────────────────────────────
    let (model_output, written, typeset) = match config.mode {
        RunMode::Latex => latex_stages(config, &engines, &text, &artifact, &mut stats).await?,
        RunMode::Text => text_stages(config, &engines, &text, &artifact, &mut stats).await?,
    };

    stats.artifact_bytes = written;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Conversion complete: {} ({} bytes), {}ms total",
        artifact.display(),
        stats.artifact_bytes,
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        mode: config.mode,
        input: pdf_path,
        extracted_text: text,
        artifact,
        model_output,
        typeset,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2TexError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2TexError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Where this run writes its file.
///
/// * latex: `<build_dir>/<stem><suffix>.tex`
/// * text:  `<stem>.txt` beside a local input, or in `<build_dir>` for a
///   downloaded one (its temp directory disappears with the run)
pub fn artifact_path(resolved: &ResolvedInput, config: &ConversionConfig) -> PathBuf {
    let stem = resolved.stem();
    match config.mode {
        RunMode::Latex => config.build_dir.join(artifact_file_name(&stem, config)),
        RunMode::Text if resolved.is_downloaded() => config.build_dir.join(format!("{stem}.txt")),
        RunMode::Text => resolved.path().with_extension("txt"),
    }
}

/// `<stem><suffix>.tex`, e.g. `report_SOW.tex`.
pub fn artifact_file_name(stem: &str, config: &ConversionConfig) -> String {
    format!("{stem}{}.tex", config.artifact_suffix)
}

/// Write `contents` to `path` via a sibling temp file and a rename, creating
/// the parent directory first.
///
/// Readers never observe a half-written file, and a re-run replaces the
/// previous file in one step.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), Pdf2TexError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Pdf2TexError::BuildDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| Pdf2TexError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(Pdf2TexError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// The three engines for one run.
struct Engines {
    extractor: Arc<dyn TextExtractor>,
    model: Arc<dyn ModelEngine>,
    typesetter: Arc<dyn Typesetter>,
}

impl Engines {
    /// Pre-built engines from the config win; otherwise build the CLI
    /// engines from the configured program names.
    fn resolve(config: &ConversionConfig) -> Self {
        let extractor = config.extractor.clone().unwrap_or_else(|| {
            Arc::new(PdfToText::new(&config.extractor_program)) as Arc<dyn TextExtractor>
        });
        let model = config.model_engine.clone().unwrap_or_else(|| {
            Arc::new(OllamaCli::new(&config.model_program, &config.model)) as Arc<dyn ModelEngine>
        });
        let typesetter = config.typesetter.clone().unwrap_or_else(|| {
            Arc::new(
                PdfLatex::new(&config.typesetter_program)
                    .with_args(config.typesetter_args.iter().cloned()),
            ) as Arc<dyn Typesetter>
        });
        Self {
            extractor,
            model,
            typesetter,
        }
    }
}

type ModeResult = (String, usize, Option<typeset::TypesetReport>);

/// latex mode: model → write artifact → (optionally) typeset.
///
/// A failed model call writes nothing, but the typesetter is still run on
/// whatever the build directory holds: `ArtifactMissing` on a first run,
/// or the previous run's artifact. The model error is what gets returned.
async fn latex_stages(
    config: &ConversionConfig,
    engines: &Engines,
    text: &str,
    artifact: &Path,
    stats: &mut ConversionStats,
) -> Result<ModeResult, Pdf2TexError> {
    let model_start = Instant::now();
    let model_result = run_stage(
        config,
        Stage::Model,
        engines.model.name(),
        model::convert_to_artifact(
            engines.model.as_ref(),
            text,
            config.fence_tags.as_slice(),
            artifact,
        ),
        |g: &model::GeneratedArtifact| g.cleaned.len(),
    )
    .await;
    stats.model_duration_ms = model_start.elapsed().as_millis() as u64;

    let generated = match model_result {
        Ok(generated) => generated,
        Err(model_err) => {
            if config.typeset {
                if let Err(e) = typeset_stage(config, engines, artifact, stats).await {
                    warn!("Typesetting after failed model run: {}", e);
                }
            }
            return Err(model_err);
        }
    };

    let report = if config.typeset {
        Some(typeset_stage(config, engines, artifact, stats).await?)
    } else {
        debug!("Typesetting disabled; stopping after {}", artifact.display());
        None
    };

    Ok((generated.raw, generated.cleaned.len(), report))
}

/// Compile `artifact` inside its parent directory.
async fn typeset_stage(
    config: &ConversionConfig,
    engines: &Engines,
    artifact: &Path,
    stats: &mut ConversionStats,
) -> Result<typeset::TypesetReport, Pdf2TexError> {
    let artifact_name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let build_dir = artifact.parent().unwrap_or(&config.build_dir);

    let typeset_start = Instant::now();
    let report = run_stage(
        config,
        Stage::Typeset,
        engines.typesetter.name(),
        typeset::build_document(engines.typesetter.as_ref(), build_dir, &artifact_name),
        |r: &typeset::TypesetReport| r.stdout.len(),
    )
    .await;
    stats.typeset_duration_ms = typeset_start.elapsed().as_millis() as u64;
    report
}

/// text mode: write the extracted text → model (reply returned, not written).
async fn text_stages(
    config: &ConversionConfig,
    engines: &Engines,
    text: &str,
    artifact: &Path,
    stats: &mut ConversionStats,
) -> Result<ModeResult, Pdf2TexError> {
    run_stage(
        config,
        Stage::SaveText,
        "filesystem",
        write_atomic(artifact, text),
        |_: &()| text.len(),
    )
    .await?;
    info!("Wrote {}", artifact.display());

    let model_start = Instant::now();
    let reply = run_stage(
        config,
        Stage::Model,
        engines.model.name(),
        model::generate(engines.model.as_ref(), text),
        |r: &String| r.len(),
    )
    .await?;
    stats.model_duration_ms = model_start.elapsed().as_millis() as u64;

    Ok((reply, text.len(), None))
}

/// Await one stage, reporting start/complete/error to the progress callback.
async fn run_stage<T, F, L>(
    config: &ConversionConfig,
    stage: Stage,
    engine: &str,
    fut: F,
    output_len: L,
) -> Result<T, Pdf2TexError>
where
    F: Future<Output = Result<T, Pdf2TexError>>,
    L: FnOnce(&T) -> usize,
{
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage, engine);
    }
    let result = fut.await;
    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(value) => cb.on_stage_complete(stage, output_len(value)),
            Err(e) => cb.on_stage_error(stage, &e.to_string()),
        }
    }
    result
}
